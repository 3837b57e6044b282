pub mod export;
pub mod pivot;
pub mod summary_row;

pub use export::{save_equity_csv, save_fills_csv, save_growth_csv, write_pivot, ReportError};
pub use pivot::{round2, PivotTable, HEADER, TOTAL_LABEL};
pub use summary_row::{SkipReason, SummaryRow};

use std::time::Duration;

//what one instrument contributed to the batch
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentOutcome {
    Summarized(SummaryRow),
    Skipped { code: String, reason: SkipReason },
}

impl InstrumentOutcome {
    pub fn code(&self) -> &str {
        match self {
            InstrumentOutcome::Summarized(row) => &row.code,
            InstrumentOutcome::Skipped { code, .. } => code,
        }
    }
}

//collected outcomes of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<InstrumentOutcome>,
    //pnl over every simulated instrument, skipped ones included
    pub accumulated_pnl: f64,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn rows(&self) -> Vec<SummaryRow> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                InstrumentOutcome::Summarized(row) => Some(row.clone()),
                InstrumentOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            InstrumentOutcome::Skipped { code, reason } => Some((code.as_str(), reason)),
            InstrumentOutcome::Summarized(_) => None,
        })
    }

    pub fn pivot(&self) -> Option<PivotTable> {
        PivotTable::build(&self.rows())
    }

    pub fn instruments(&self) -> usize {
        self.outcomes.len()
    }

    //average seconds per instrument
    pub fn average_seconds(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.elapsed.as_secs_f64() / self.outcomes.len() as f64
    }
}
