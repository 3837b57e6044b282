use crate::data::error::DataError;
use crate::data::loader::{parse_date, read_records};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CalendarRecord {
    cal_date: String,
    is_open: i64,
}

//which side of the pivot to search when looking for the nearest open day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

//sorted set of exchange open days
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradingCalendar {
    open_days: Vec<NaiveDate>,
}

impl TradingCalendar {
    pub fn from_days(mut days: Vec<NaiveDate>) -> Self {
        days.sort();
        days.dedup();
        TradingCalendar { open_days: days }
    }

    //loads cal_date/is_open rows, keeping the open ones
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let records: Vec<CalendarRecord> = read_records(path)?;

        let days = records
            .iter()
            .filter(|r| r.is_open == 1)
            .map(|r| parse_date(&r.cal_date, path))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_days(days))
    }

    pub fn len(&self) -> usize {
        self.open_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open_days.is_empty()
    }

    pub fn is_open(&self, date: NaiveDate) -> bool {
        self.open_days.binary_search(&date).is_ok()
    }

    //open days within [start, end]
    pub fn open_days_between(&self, start: NaiveDate, end: NaiveDate) -> &[NaiveDate] {
        if start > end {
            return &[];
        }
        let lo = self.open_days.partition_point(|d| *d < start);
        let hi = self.open_days.partition_point(|d| *d <= end);
        &self.open_days[lo..hi]
    }

    //closest open day on or after (Forward) / on or before (Backward) the pivot
    pub fn nearest(&self, pivot: NaiveDate, direction: Direction) -> Option<NaiveDate> {
        match direction {
            Direction::Forward => {
                let idx = self.open_days.partition_point(|d| *d < pivot);
                self.open_days.get(idx).copied()
            }
            Direction::Backward => {
                let idx = self.open_days.partition_point(|d| *d <= pivot);
                idx.checked_sub(1).map(|i| self.open_days[i])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y%m%d").unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::from_days(vec![
            d("20210108"),
            d("20210104"),
            d("20210105"),
            d("20210111"),
        ])
    }

    #[test]
    fn range_is_inclusive() {
        let cal = calendar();
        assert_eq!(
            cal.open_days_between(d("20210105"), d("20210110")),
            &[d("20210105"), d("20210108")]
        );
        assert!(cal.open_days_between(d("20210110"), d("20210101")).is_empty());
    }

    #[test]
    fn nearest_skips_weekend() {
        let cal = calendar();
        assert_eq!(
            cal.nearest(d("20210109"), Direction::Forward),
            Some(d("20210111"))
        );
        assert_eq!(
            cal.nearest(d("20210109"), Direction::Backward),
            Some(d("20210108"))
        );
        assert_eq!(cal.nearest(d("20210101"), Direction::Backward), None);
        assert_eq!(
            cal.nearest(d("20210104"), Direction::Forward),
            Some(d("20210104"))
        );
    }

    #[test]
    fn load_keeps_open_days_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade_calendar.csv");
        std::fs::write(
            &path,
            "exchange,cal_date,is_open\nSSE,20210101,0\nSSE,20210104,1\nSSE,20210105,1\n",
        )
        .unwrap();

        let cal = TradingCalendar::load(&path).unwrap();
        assert_eq!(cal.len(), 2);
        assert!(!cal.is_open(d("20210101")));
    }
}
