//a Rust-based daily equity strategy backtester with board-lot sizing and batch reports

pub mod config;
pub mod data;
pub mod engine;
pub mod instrument;
pub mod metrics;
pub mod portfolio;
pub mod report;
pub mod sizer;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BacktestConfiguration, BollingerParams, BuyAndHoldParams, RandomTrailingParams,
        StrategyKind, TrendCrossoverParams,
    };
    pub use crate::data::{
        growth_from_local, load_csv, Bar, DataError, InstrumentSeries, LocalStore, Scope,
        TradingCalendar, UniverseFilter,
    };
    pub use crate::engine::{
        run_batch, BacktestConfig, BacktestEngine, BacktestResult, CostModel, EngineError,
        ExecutionEngine, Fill, OrderIntent, OrderSide, OrderType,
    };
    pub use crate::instrument::StockInfo;
    pub use crate::metrics::{EquityPoint, SummaryMetrics, TradeAnalysis};
    pub use crate::portfolio::{Account, Position, TradeRecord};
    pub use crate::report::{
        save_equity_csv, save_fills_csv, write_pivot, BatchReport, InstrumentOutcome,
        PivotTable, SkipReason, SummaryRow,
    };
    pub use crate::sizer::{AllInOut, TieredStake, LOT_SIZE};
    pub use crate::strategy::{Strategy, StrategyContext};
}
