use std::path::PathBuf;
use thiserror::Error;

//failures raised while reading cached market data and reference files
#[derive(Error, Debug)]
pub enum DataError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to read CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid date '{value}' in {path:?}")]
    InvalidDate { value: String, path: PathBuf },
    #[error("Duplicate bar for {date} in {path:?}")]
    DuplicateDate { date: chrono::NaiveDate, path: PathBuf },
    #[error("Trading calendar has no open day between {start} and {end}")]
    EmptyCalendar {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("Unknown universe scope: {0}")]
    UnknownScope(String),
}

impl DataError {
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        DataError::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}
