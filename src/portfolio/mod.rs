pub mod account;
pub mod position;
pub mod trade;

pub use account::Account;
pub use position::Position;
pub use trade::{TradeRecord, TradeTracker};
