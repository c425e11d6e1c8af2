use crate::month::MonthKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the simulator treats a month whose close price is missing or non-positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPricePolicy {
    /// The affected month contributes no growth.
    #[default]
    ZeroGrowth,
    /// The last known price at or before the month stands in for the missing one.
    CarryForward,
}

/// Where a holding's monthly growth rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthSource {
    /// Both the current and next month had a usable close.
    Observed,
    /// At least one close was replaced by the previous known price.
    CarriedForward,
    /// No usable close; growth was forced to zero.
    Fallback,
}

/// A recoverable condition that was handled locally and reported alongside the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BacktestWarning {
    /// The provider returned nothing usable for a portfolio or benchmark
    /// symbol, which was left out of the run.
    DataUnavailable { symbol: String, reason: String },
    /// A calendar year had fewer than two observations and yields no annual record.
    InsufficientHistory {
        symbol: String,
        year: i32,
        observations: usize,
    },
    /// The simulator fell back for this month instead of using an observed close.
    MissingPrice { symbol: String, month: MonthKey },
}

impl BacktestWarning {
    pub fn symbol(&self) -> &str {
        match self {
            BacktestWarning::DataUnavailable { symbol, .. }
            | BacktestWarning::InsufficientHistory { symbol, .. }
            | BacktestWarning::MissingPrice { symbol, .. } => symbol,
        }
    }
}

impl fmt::Display for BacktestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestWarning::DataUnavailable { symbol, reason } => {
                write!(f, "{symbol}: data unavailable, left out of the run ({reason})")
            }
            BacktestWarning::InsufficientHistory {
                symbol,
                year,
                observations,
            } => write!(
                f,
                "{symbol}: only {observations} observation(s) in {year}, no annual return"
            ),
            BacktestWarning::MissingPrice { symbol, month } => {
                write!(f, "{symbol}: no usable close for {month}, growth fallback applied")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_data_message_fits_benchmark_symbols() {
        let warning = BacktestWarning::DataUnavailable {
            symbol: "SPY".to_string(),
            reason: "unknown symbol".to_string(),
        };
        let message = warning.to_string();

        assert_eq!(message, "SPY: data unavailable, left out of the run (unknown symbol)");
        assert!(!message.contains("portfolio"));
    }
}
