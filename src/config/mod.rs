pub mod backtest_config;

pub use backtest_config::{
    BacktestConfiguration, BollingerParams, BuyAndHoldParams, RandomTrailingParams, StrategyKind,
    TrendCrossoverParams,
};
