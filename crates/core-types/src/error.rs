use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Invalid backtest window: {0}")]
    InvalidWindow(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("No price data available for symbol '{0}'")]
    DataUnavailable(String),
}
