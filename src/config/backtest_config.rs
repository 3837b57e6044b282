use crate::data::Scope;
use crate::engine::execution::CostModel;
use crate::strategy::{
    BollingerStrategy, BuyAndHoldStrategy, RandomTrailingStrategy, Strategy,
    TrendCrossoverStrategy,
};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//bollinger mean reversion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerParams {
    pub period: usize,
    pub devfactor: f64,
    //exit when close < average entry * stop_loss
    pub stop_loss: Option<f64>,
    //trailing stop attached to entries from flat
    pub trail_percent: Option<f64>,
    pub pyramiding: bool,
}

impl Default for BollingerParams {
    fn default() -> Self {
        BollingerParams {
            period: 20,
            devfactor: 2.0,
            stop_loss: Some(0.95),
            trail_percent: Some(0.05),
            pyramiding: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyAndHoldParams {
    pub cash_fraction: f64,
}

impl Default for BuyAndHoldParams {
    fn default() -> Self {
        BuyAndHoldParams { cash_fraction: 0.9 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomTrailingParams {
    pub cash_fraction: f64,
    pub trail_percent: f64,
}

impl Default for RandomTrailingParams {
    fn default() -> Self {
        RandomTrailingParams {
            cash_fraction: 0.9,
            trail_percent: 0.05,
        }
    }
}

//trend crossover parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendCrossoverParams {
    pub fast_window: usize,
    pub slow_window: usize,
    //moving average lengths ranked against their values
    pub lookbacks: Vec<usize>,
    pub stake: u64,
}

impl Default for TrendCrossoverParams {
    fn default() -> Self {
        TrendCrossoverParams {
            fast_window: 5,
            slow_window: 10,
            lookbacks: vec![3, 5, 10, 20, 60],
            stake: 10,
        }
    }
}

//strategy kind with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    Bollinger(BollingerParams),
    BuyAndHold(BuyAndHoldParams),
    RandomTrailing(RandomTrailingParams),
    TrendCrossover(TrendCrossoverParams),
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::BuyAndHold(BuyAndHoldParams::default())
    }
}

impl StrategyKind {
    //parse strategy kind from string, with default parameters
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "boll" | "bollinger" => Some(StrategyKind::Bollinger(BollingerParams::default())),
            "bh" | "buy_and_hold" | "buyandhold" => {
                Some(StrategyKind::BuyAndHold(BuyAndHoldParams::default()))
            }
            "random" | "random_trailing" | "ts" => {
                Some(StrategyKind::RandomTrailing(RandomTrailingParams::default()))
            }
            "trend" | "sma" | "trend_crossover" => {
                Some(StrategyKind::TrendCrossover(TrendCrossoverParams::default()))
            }
            _ => None,
        }
    }

    //display name, also the report file prefix
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Bollinger(_) => "Bollinger Band",
            StrategyKind::BuyAndHold(_) => "Buy and Hold",
            StrategyKind::RandomTrailing(_) => "Random Trailing Stop",
            StrategyKind::TrendCrossover(_) => "Trend Crossover",
        }
    }

    //short parameter tag, eg TS005 for a 5% trail
    pub fn identifier(&self) -> String {
        fn trail_tag(pct: f64) -> String {
            format!("TS{:03}", (pct * 100.0).round() as u32)
        }

        match self {
            StrategyKind::Bollinger(p) => {
                let mut id = format!("P{}D{}", p.period, p.devfactor);
                if let Some(pct) = p.trail_percent {
                    id.push('_');
                    id.push_str(&trail_tag(pct));
                }
                id
            }
            StrategyKind::BuyAndHold(_) => String::new(),
            StrategyKind::RandomTrailing(p) => trail_tag(p.trail_percent),
            StrategyKind::TrendCrossover(p) => format!("F{}S{}", p.fast_window, p.slow_window),
        }
    }

    //fresh strategy instance for one instrument
    pub fn build(&self, seed: u64) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Bollinger(p) => Box::new(BollingerStrategy::new(p.clone())),
            StrategyKind::BuyAndHold(p) => Box::new(BuyAndHoldStrategy::new(p.clone())),
            StrategyKind::RandomTrailing(p) => {
                Box::new(RandomTrailingStrategy::new(p.clone(), seed))
            }
            StrategyKind::TrendCrossover(p) => Box::new(TrendCrossoverStrategy::new(p.clone())),
        }
    }
}

//complete batch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //data
    pub data_dir: PathBuf,
    pub index_dir: Option<PathBuf>,
    pub watchlist: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adjusted: bool,

    //universe
    pub scope: Scope,
    pub sample_size: usize,
    pub main_board_only: bool,
    pub ignore_st: bool,
    pub ignore_ipo: bool,

    //account settings
    pub initial_cash: f64,
    pub costs: CostModel,

    //strategy
    pub strategy: StrategyKind,
    pub seed: Option<u64>,

    //outputs
    pub output_dir: PathBuf,
    pub plot: bool,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_dir: PathBuf::from("./data/daily/"),
            index_dir: None,
            watchlist: None,
            start_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2022, 1, 28).unwrap_or_default(),
            adjusted: true,
            scope: Scope::Random,
            sample_size: 100,
            main_board_only: true,
            ignore_st: true,
            ignore_ipo: true,
            initial_cash: 10000.0,
            costs: CostModel::default(),
            strategy: StrategyKind::default(),
            seed: None,
            output_dir: PathBuf::from("./result"),
            plot: false,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //where the pivoted summary is written
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.csv",
            self.strategy.name(),
            self.strategy.identifier()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_kinds() {
        assert!(matches!(
            StrategyKind::parse("BOLL"),
            Some(StrategyKind::Bollinger(_))
        ));
        assert!(matches!(
            StrategyKind::parse("random"),
            Some(StrategyKind::RandomTrailing(_))
        ));
        assert!(StrategyKind::parse("macd").is_none());
    }

    #[test]
    fn identifiers_name_the_report() {
        let kind = StrategyKind::parse("random").unwrap();
        assert_eq!(kind.identifier(), "TS005");
        assert_eq!(StrategyKind::parse("boll").unwrap().identifier(), "P20D2_TS005");

        let config = BacktestConfiguration::default();
        assert_eq!(
            config.report_path(),
            PathBuf::from("./result").join("Buy and Hold_.csv")
        );
    }

    #[test]
    fn json_round_trip_keeps_strategy_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BacktestConfiguration::default();
        config.strategy = StrategyKind::TrendCrossover(TrendCrossoverParams {
            stake: 20,
            ..TrendCrossoverParams::default()
        });
        config.to_json_file(&path).unwrap();

        let loaded = BacktestConfiguration::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: BacktestConfiguration =
            serde_json::from_str(r#"{"strategy": {"kind": "bollinger", "period": 10}}"#).unwrap();
        match config.strategy {
            StrategyKind::Bollinger(p) => {
                assert_eq!(p.period, 10);
                assert_eq!(p.stop_loss, Some(0.95));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(config.initial_cash, 10000.0);
    }
}
