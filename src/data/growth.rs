use crate::data::calendar::TradingCalendar;
use crate::data::error::DataError;
use crate::data::loader::LocalStore;
use crate::instrument::StockInfo;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

//price growth of one instrument between two open days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRow {
    pub code: String,
    pub name: String,
    pub start_price: f64,
    pub end_price: f64,
    pub total_growth: f64,
    //annualized growth in percent, rounded to two decimals
    pub annual_growth: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//ranks instruments by annualized growth, best first
//codes missing either price or reference data are dropped
pub fn rank_growth(
    start_prices: &IndexMap<String, f64>,
    end_prices: &HashMap<String, f64>,
    start: NaiveDate,
    end: NaiveDate,
    stocks: &IndexMap<String, StockInfo>,
) -> Vec<GrowthRow> {
    let years = (end - start).num_days() as f64 / 365.0;

    let mut rows: Vec<GrowthRow> = start_prices
        .iter()
        .filter_map(|(code, &p1)| {
            let p2 = *end_prices.get(code)?;
            let info = stocks.get(code)?;
            let total_growth = p2 / p1;
            let annual_growth = round2((total_growth.powf(1.0 / years) - 1.0) * 100.0);

            (total_growth.is_finite() && annual_growth.is_finite()).then(|| GrowthRow {
                code: code.clone(),
                name: info.name.clone(),
                start_price: p1,
                end_price: p2,
                total_growth,
                annual_growth,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.annual_growth.total_cmp(&a.annual_growth));
    rows
}

//adjusted closes (close x raw adjustment factor) of every code on a date
fn adjusted_closes(store: &LocalStore, date: NaiveDate) -> Result<IndexMap<String, f64>, DataError> {
    let factors: HashMap<String, f64> = store
        .adj_factors(date)?
        .into_iter()
        .filter_map(|r| Some((r.ts_code, r.adj_factor?)))
        .collect();

    Ok(store
        .daily(date)?
        .into_iter()
        .filter_map(|r| {
            let factor = factors.get(&r.ts_code)?;
            Some((r.ts_code, r.close? * factor))
        })
        .collect())
}

//growth between the first and last open days of [start, end]
pub fn growth_from_local(
    store: &LocalStore,
    calendar: &TradingCalendar,
    start: NaiveDate,
    end: NaiveDate,
    stocks: &IndexMap<String, StockInfo>,
) -> Result<Vec<GrowthRow>, DataError> {
    let days = calendar.open_days_between(start, end);
    let (first, last) = match (days.first(), days.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(DataError::EmptyCalendar { start, end }),
    };

    let start_prices = adjusted_closes(store, first)?;
    let end_prices: HashMap<String, f64> = adjusted_closes(store, last)?.into_iter().collect();

    Ok(rank_growth(&start_prices, &end_prices, first, last, stocks))
}
