use core_types::AnnualReturnRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money totals of a simulated trajectory, before any return is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthTotals {
    pub initial_amount: Decimal,
    pub final_amount: Decimal,
    /// Initial amount plus every recurring contribution made over the window.
    pub cumulative_investment: Decimal,
    /// Calendar months in the window, both ends included.
    pub month_count: u32,
}

/// The headline figures of one backtest run.
///
/// All amounts are in the native currency of the price data; see
/// [`PortfolioResult::converted`] for presentation in another one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub initial_amount: Decimal,
    pub final_amount: Decimal,
    pub cumulative_investment: Decimal,
    pub total_return_pct: Decimal,

    pub annualized_return_pct: Option<Decimal>, // None when the power cannot be evaluated
    pub standard_deviation_pct: Option<Decimal>, // None without annual records
    pub max_return_year: Option<AnnualReturnRecord>,
    pub min_return_year: Option<AnnualReturnRecord>,
    pub sharpe_ratio: Option<Decimal>,
    pub sortino_ratio: Option<Decimal>,
}

/// A benchmark run carries exactly the same figures as the portfolio it is compared to.
pub type BenchmarkResult = PortfolioResult;

impl PortfolioResult {
    /// Final amount less the initial amount.
    pub fn profit(&self) -> Decimal {
        self.final_amount - self.initial_amount
    }

    /// Returns a copy with every amount multiplied by `rate`, or `None` if an
    /// amount leaves the `Decimal` range.
    /// Percentages and ratios are currency-independent and stay as they are.
    pub fn converted(&self, rate: Decimal) -> Option<Self> {
        Some(Self {
            initial_amount: self.initial_amount.checked_mul(rate)?,
            final_amount: self.final_amount.checked_mul(rate)?,
            cumulative_investment: self.cumulative_investment.checked_mul(rate)?,
            ..self.clone()
        })
    }
}
