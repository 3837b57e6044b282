pub mod backtest;
pub mod batch;
pub mod execution;
pub mod trailing;

pub use backtest::{BacktestConfig, BacktestEngine, BacktestResult, EngineError};
pub use batch::run_batch;
pub use execution::{
    BarReport, CostModel, ExecutionEngine, Fill, Order, OrderEvent, OrderId, OrderIntent,
    OrderSide, OrderStatus, OrderType, Quantity, RejectReason,
};
pub use trailing::TrailingStop;
