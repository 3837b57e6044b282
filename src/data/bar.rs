use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//one daily ohlcv record for one instrument
//open interest is carried for feed compatibility and is always zero for equities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        //validate high >= low
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        //validate close within [low, high]
        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        //validate open within [low, high]
        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        //validate non-negative volume
        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Self::new_unchecked(date, open, high, low, close, volume))
    }

    //creates a Bar without validation
    pub fn new_unchecked(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
            open_interest: 0.0,
        }
    }

    //a bar where every price equals close, handy for close-only series
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self::new_unchecked(date, close, close, close, close, 0.0)
    }

    //multiplies o/h/l/c by an adjustment factor
    pub fn adjusted(&self, factor: f64) -> Self {
        Bar {
            open: self.open * factor,
            high: self.high * factor,
            low: self.low * factor,
            close: self.close * factor,
            ..self.clone()
        }
    }
}

//the bar series of one instrument, ascending by date
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    pub code: String,
    pub bars: Vec<Bar>,
}

impl InstrumentSeries {
    pub fn new(code: impl Into<String>, bars: Vec<Bar>) -> Self {
        InstrumentSeries {
            code: code.into(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    fn rejects_close_outside_range() {
        let err = Bar::new(day(1), 10.0, 11.0, 9.0, 12.0, 100.0).unwrap_err();
        assert_eq!(
            err,
            BarError::InvalidClose {
                close: 12.0,
                high: 11.0,
                low: 9.0
            }
        );
    }

    #[test]
    fn open_interest_is_zero() {
        let bar = Bar::new(day(1), 10.0, 11.0, 9.0, 10.5, 100.0).unwrap();
        assert_eq!(bar.open_interest, 0.0);
    }

    #[test]
    fn adjusted_scales_prices_but_not_volume() {
        let bar = Bar::new(day(2), 10.0, 12.0, 8.0, 11.0, 500.0).unwrap();
        let adj = bar.adjusted(0.5);
        assert_eq!(adj.open, 5.0);
        assert_eq!(adj.high, 6.0);
        assert_eq!(adj.low, 4.0);
        assert_eq!(adj.close, 5.5);
        assert_eq!(adj.volume, 500.0);
    }
}
