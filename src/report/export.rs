use crate::data::GrowthRow;
use crate::engine::execution::Fill;
use crate::metrics::EquityPoint;
use crate::report::pivot::PivotTable;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write CSV {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn write_records<T: Serialize>(
    records: impl IntoIterator<Item = T>,
    path: &Path,
) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let csv_err = |source: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

//writes the pivoted summary, total row last
pub fn write_pivot(table: &PivotTable, path: &Path) -> Result<(), ReportError> {
    write_records(table.records(), path)
}

//per-bar value curve for external charting
pub fn save_equity_csv(equity_curve: &[EquityPoint], path: &Path) -> Result<(), ReportError> {
    write_records(equity_curve, path)
}

pub fn save_fills_csv(fills: &[Fill], path: &Path) -> Result<(), ReportError> {
    write_records(fills, path)
}

pub fn save_growth_csv(rows: &[GrowthRow], path: &Path) -> Result<(), ReportError> {
    write_records(rows, path)
}
