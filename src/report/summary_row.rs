use crate::metrics::TradeAnalysis;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//why an instrument contributes no summary row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("no trades recorded")]
    NoTrades,
    #[error("no closed trades")]
    NoClosedTrades,
    #[error("non-finite {0}")]
    NonFinite(&'static str),
    #[error("engine error: {0}")]
    Engine(String),
}

//one instrument's line in the batch summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub code: String,
    #[serde(rename = "PnL")]
    pub pnl: f64,
    #[serde(rename = "Trades")]
    pub trades: usize,
    #[serde(rename = "Wins")]
    pub wins: usize,
    #[serde(rename = "Win_Ratio")]
    pub win_ratio: f64,
    #[serde(rename = "Losts")]
    pub losts: usize,
    #[serde(rename = "Lost_Ratio")]
    pub lost_ratio: f64,
    #[serde(rename = "Win_Value")]
    pub win_value: f64,
    #[serde(rename = "Win_Avg")]
    pub win_avg: f64,
    #[serde(rename = "Win_Max")]
    pub win_max: f64,
    #[serde(rename = "Lost_Value")]
    pub lost_value: f64,
    #[serde(rename = "Lost_Avg")]
    pub lost_avg: f64,
    #[serde(rename = "Lost_Max")]
    pub lost_max: f64,
}

impl SummaryRow {
    //builds the row from a run's pnl and trade analysis
    pub fn build(code: &str, pnl: f64, analysis: &TradeAnalysis) -> Result<Self, SkipReason> {
        if analysis.total == 0 {
            return Err(SkipReason::NoTrades);
        }
        let win_ratio = analysis.win_ratio().ok_or(SkipReason::NoClosedTrades)?;

        let row = SummaryRow {
            code: code.to_string(),
            pnl,
            trades: analysis.won.count + analysis.lost.count,
            wins: analysis.won.count,
            win_ratio,
            losts: analysis.lost.count,
            //complement keeps win + lost at exactly 1
            lost_ratio: 1.0 - win_ratio,
            win_value: analysis.won.total,
            win_avg: analysis.won.average,
            win_max: analysis.won.max,
            lost_value: analysis.lost.total,
            lost_avg: analysis.lost.average,
            lost_max: analysis.lost.max,
        };

        match row.values().iter().find(|(_, v)| !v.is_finite()) {
            Some(&(name, _)) => Err(SkipReason::NonFinite(name)),
            None => Ok(row),
        }
    }

    //the float columns by header name
    pub fn values(&self) -> [(&'static str, f64); 9] {
        [
            ("PnL", self.pnl),
            ("Win_Ratio", self.win_ratio),
            ("Lost_Ratio", self.lost_ratio),
            ("Win_Value", self.win_value),
            ("Win_Avg", self.win_avg),
            ("Win_Max", self.win_max),
            ("Lost_Value", self.lost_value),
            ("Lost_Avg", self.lost_avg),
            ("Lost_Max", self.lost_max),
        ]
    }
}
