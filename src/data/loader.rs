use crate::data::adjust::AdjustmentFactors;
use crate::data::bar::{Bar, InstrumentSeries};
use crate::data::calendar::TradingCalendar;
use crate::data::error::DataError;
use crate::instrument::StockInfo;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

//row of a single-instrument bar file (datetime,open,high,low,close,volume,openinterest)
#[derive(Debug, Deserialize)]
struct CsvRecord {
    datetime: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    #[allow(dead_code)]
    openinterest: Option<f64>,
}

//row of a cached per-date market file
#[derive(Debug, Clone, Deserialize)]
pub struct DailyRecord {
    pub ts_code: String,
    pub trade_date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub vol: Option<f64>,
}

impl DailyRecord {
    //rows with any missing price or volume are dropped
    fn to_bar(&self, date: NaiveDate) -> Option<Bar> {
        Some(Bar::new_unchecked(
            date,
            self.open?,
            self.high?,
            self.low?,
            self.close?,
            self.vol?,
        ))
    }
}

//row of a cached per-date adjustment factor file
#[derive(Debug, Clone, Deserialize)]
pub struct AdjFactorRecord {
    pub ts_code: String,
    pub trade_date: String,
    pub adj_factor: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StockBasicRecord {
    #[serde(alias = "code")]
    ts_code: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    list_date: Option<String>,
}

//parses yyyymmdd or yyyy-mm-dd
pub fn parse_date(value: &str, path: &Path) -> Result<NaiveDate, DataError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| DataError::InvalidDate {
            value: value.to_string(),
            path: path.to_path_buf(),
        })
}

//reads every record of a headered csv file
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| DataError::csv(path, e))?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| DataError::csv(path, e))
}

//loads the bars of one instrument from a csv file
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>, DataError> {
    let path = path.as_ref();
    let records: Vec<CsvRecord> = read_records(path)?;

    let mut bars = Vec::with_capacity(records.len());
    for record in records {
        let date = parse_date(&record.datetime, path)?;
        bars.push(Bar::new_unchecked(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    //sort by date to ensure chronological order
    bars.sort_by(|a, b| a.date.cmp(&b.date));

    if let Some(pair) = bars.windows(2).find(|pair| pair[0].date == pair[1].date) {
        return Err(DataError::DuplicateDate {
            date: pair[1].date,
            path: path.to_path_buf(),
        });
    }

    Ok(bars)
}

//turns NotFound into "no data for this slice"
fn skip_missing<T>(result: Result<T, DataError>) -> Result<Option<T>, DataError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DataError::NotFound(path)) => {
            warn!(?path, "cache file missing, treating as no data");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

//a directory of locally cached daily market files
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    //trade_calendar.csv; a missing calendar is fatal for the caller
    pub fn trade_calendar(&self) -> Result<TradingCalendar, DataError> {
        TradingCalendar::load(self.file("trade_calendar.csv"))
    }

    //<yyyymmdd>.csv
    pub fn daily(&self, date: NaiveDate) -> Result<Vec<DailyRecord>, DataError> {
        read_records(&self.file(&format!("{}.csv", date.format("%Y%m%d"))))
    }

    //adj_factor_<yyyymmdd>.csv
    pub fn adj_factors(&self, date: NaiveDate) -> Result<Vec<AdjFactorRecord>, DataError> {
        read_records(&self.file(&format!("adj_factor_{}.csv", date.format("%Y%m%d"))))
    }

    //stock_basic.csv keyed by code, in file order
    pub fn stock_basic(&self) -> Result<IndexMap<String, StockInfo>, DataError> {
        let path = self.file("stock_basic.csv");
        let records: Vec<StockBasicRecord> = read_records(&path)?;

        let mut stocks = IndexMap::with_capacity(records.len());
        for record in records {
            let list_date = match record.list_date.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => Some(parse_date(s, &path)?),
                _ => None,
            };
            let info = StockInfo::new(
                record.ts_code.clone(),
                record.name.unwrap_or_default(),
                record.market.unwrap_or_default(),
                list_date,
            );
            stocks.insert(record.ts_code, info);
        }

        Ok(stocks)
    }

    //loads every instrument traded on the open days of [start, end]
    //missing per-date files are skipped with a warning
    pub fn load_range(
        &self,
        calendar: &TradingCalendar,
        start: NaiveDate,
        end: NaiveDate,
        adjusted: bool,
    ) -> Result<Vec<InstrumentSeries>, DataError> {
        let dates = calendar.open_days_between(start, end);
        if dates.is_empty() {
            return Err(DataError::EmptyCalendar { start, end });
        }

        info!(days = dates.len(), root = ?self.root, "loading daily bars from local cache");

        let per_day = dates
            .par_iter()
            .map(|&date| -> Result<_, DataError> {
                let daily = skip_missing(self.daily(date))?;
                let factors = if adjusted {
                    skip_missing(self.adj_factors(date))?
                } else {
                    None
                };
                Ok((date, daily, factors))
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        let mut grouped: IndexMap<String, Vec<Bar>> = IndexMap::new();
        let mut factors = AdjustmentFactors::default();

        for (date, daily, day_factors) in per_day {
            for record in daily.unwrap_or_default() {
                if let Some(bar) = record.to_bar(date) {
                    grouped.entry(record.ts_code).or_default().push(bar);
                }
            }
            for record in day_factors.unwrap_or_default() {
                if let Some(factor) = record.adj_factor {
                    factors.insert(&record.ts_code, date, factor);
                }
            }
        }

        let mut series: Vec<InstrumentSeries> = grouped
            .into_iter()
            .map(|(code, bars)| InstrumentSeries::new(code, bars))
            .map(|s| if adjusted { factors.apply(&s) } else { s })
            .filter(|s| !s.is_empty())
            .collect();

        series.sort_by(|a, b| a.code.cmp(&b.code));

        info!(instruments = series.len(), "local cache loaded");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y%m%d").unwrap()
    }

    #[test]
    fn parses_both_date_layouts() {
        let p = Path::new("x.csv");
        assert_eq!(parse_date("20210104", p).unwrap(), date("20210104"));
        assert_eq!(parse_date("2021-01-04", p).unwrap(), date("20210104"));
        assert!(parse_date("04/01/2021", p).is_err());
    }

    #[test]
    fn load_csv_sorts_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("601318.csv");
        fs::write(
            &path,
            "datetime,open,high,low,close,volume,openinterest\n\
             2021-01-05,11,12,10,11.5,100,0\n\
             2021-01-04,10,11,9,10.5,100,0\n",
        )
        .unwrap();

        let bars = load_csv(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date("20210104"));

        fs::write(
            &path,
            "datetime,open,high,low,close,volume\n\
             2021-01-04,10,11,9,10.5,100\n\
             2021-01-04,10,11,9,10.5,100\n",
        )
        .unwrap();
        assert!(matches!(
            load_csv(&path),
            Err(DataError::DuplicateDate { .. })
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv(dir.path().join("nope.csv")).unwrap_err();
        assert!(err.is_not_found());
    }
}
