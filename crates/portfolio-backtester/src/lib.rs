//! # Portfolio Backtester
//!
//! Ties the pipeline together: validates a portfolio, loads every price
//! series concurrently, runs the growth simulation and analytics, and
//! compares the result against a benchmark instrument.

pub mod benchmark;
pub mod data_handler;
pub mod error;
pub mod manager;
pub mod pipeline;
pub mod validator;

pub use benchmark::{BenchmarkRun, BenchmarkRunner};
pub use data_handler::{PriceData, load_price_data};
pub use error::PortfolioError;
pub use manager::{BacktestOutcome, BacktestSettings, PortfolioManager, run_backtest};
pub use pipeline::{Pipeline, PipelineRun};
pub use validator::validate;
