pub mod adjust;
pub mod bar;
pub mod calendar;
pub mod error;
pub mod growth;
pub mod loader;
pub mod universe;

pub use adjust::AdjustmentFactors;
pub use bar::{Bar, BarError, InstrumentSeries};
pub use calendar::{Direction, TradingCalendar};
pub use error::DataError;
pub use growth::{growth_from_local, rank_growth, GrowthRow};
pub use loader::{load_csv, parse_date, LocalStore};
pub use universe::{load_index_members, load_watchlist, Scope, UniverseFilter};
