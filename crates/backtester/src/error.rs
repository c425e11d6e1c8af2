use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid backtest window: {0}")]
    InvalidWindow(String),

    #[error("No instrument has price data to simulate.")]
    NoInstruments,

    #[error("Amounts exceed the representable range: {0}")]
    Overflow(String),
}
