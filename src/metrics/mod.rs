pub mod summary;
pub mod timeseries;
pub mod trades;

pub use summary::SummaryMetrics;
pub use timeseries::{calculate_equity_curve, max_drawdown, EquityPoint};
pub use trades::{PnlStats, TradeAnalysis};
