//! # Return and Risk Analytics
//!
//! Pure calculators over normalized price tables and simulated trajectories.
//! Nothing in this crate performs I/O; it depends only on `core-types`.
//!
//! ## Public API
//!
//! - `ReturnAnalyzer`: per-year returns and per-instrument window summaries.
//! - `RiskMetrics`: standard deviation, Sharpe, Sortino and best/worst year.
//! - `AnalyticsEngine`: combines the above into a `PortfolioResult`.
//! - `ExportReport`: the flat record handed to external tools.

pub mod engine;
pub mod error;
pub mod export;
pub mod metrics;
pub mod report;
pub mod returns;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use export::{ExportAnnualRow, ExportInstrumentRow, ExportReport, ExportSummary};
pub use metrics::{RiskMetrics, RiskReport, DEFAULT_RISK_FREE_RATE_PCT};
pub use report::{BenchmarkResult, GrowthTotals, PortfolioResult};
pub use returns::{AnnualReturns, InstrumentSummary, ReturnAnalyzer};
