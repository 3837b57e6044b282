use crate::data::bar::InstrumentSeries;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::BTreeMap;

//per-code, per-date price adjustment factors
#[derive(Debug, Clone, Default)]
pub struct AdjustmentFactors {
    by_code: IndexMap<String, BTreeMap<NaiveDate, f64>>,
}

impl AdjustmentFactors {
    pub fn insert(&mut self, code: &str, date: NaiveDate, factor: f64) {
        self.by_code
            .entry(code.to_string())
            .or_default()
            .insert(date, factor);
    }

    //factor scaled so the latest factor of the code is 1.0
    pub fn normalized(&self, code: &str, date: NaiveDate) -> Option<f64> {
        let factors = self.by_code.get(code)?;
        let (_, &latest) = factors.iter().next_back()?;
        let raw = *factors.get(&date)?;
        let normalized = raw / latest;
        normalized.is_finite().then_some(normalized)
    }

    //back-adjusts a series; bars without a factor are dropped
    pub fn apply(&self, series: &InstrumentSeries) -> InstrumentSeries {
        let bars = series
            .bars
            .iter()
            .filter_map(|bar| {
                self.normalized(&series.code, bar.date)
                    .map(|factor| bar.adjusted(factor))
            })
            .collect();

        InstrumentSeries::new(series.code.clone(), bars)
    }
}
