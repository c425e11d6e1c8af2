pub mod enums;
pub mod error;
pub mod month;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{BacktestWarning, GrowthSource, MissingPricePolicy};
pub use error::CoreError;
pub use month::MonthKey;
pub use series::{PricePoint, PriceSeries};
pub use structs::{
    AnnualReturnRecord, Holding, HoldingValue, Instrument, MonthlySnapshot, PortfolioConfig,
    PORTFOLIO_SYMBOL,
};
