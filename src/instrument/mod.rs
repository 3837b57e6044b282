pub mod stock;

pub use stock::{StockInfo, MAIN_BOARD, SPECIAL_TREATMENT};
