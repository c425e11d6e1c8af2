use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid portfolio: {0}")]
    Core(#[from] core_types::CoreError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] backtester::error::SimulationError),

    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("No price data available for any portfolio symbol: {0}")]
    DataUnavailable(String),

    #[error("The run was superseded by a newer request and its results were discarded.")]
    Superseded,
}
