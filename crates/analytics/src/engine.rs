use crate::error::AnalyticsError;
use crate::metrics::RiskMetrics;
use crate::report::{GrowthTotals, PortfolioResult};
use crate::returns::annualized_return_pct;
use core_types::AnnualReturnRecord;
use rust_decimal::Decimal;

/// A stateless calculator turning a simulated trajectory and its annual
/// returns into a `PortfolioResult`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {
    risk: RiskMetrics,
}

impl AnalyticsEngine {
    pub fn new(risk_free_rate_pct: Decimal) -> Self {
        Self {
            risk: RiskMetrics::new(risk_free_rate_pct),
        }
    }

    /// The main entry point for calculating the headline figures of a run.
    ///
    /// # Arguments
    ///
    /// * `totals` - The money totals produced by the growth simulation.
    /// * `portfolio_annual` - The allocation-weighted annual returns, which the
    ///   dispersion and risk-adjusted metrics are computed over.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PortfolioResult` or an `AnalyticsError` when
    /// the totals cannot produce a return.
    pub fn calculate(
        &self,
        totals: &GrowthTotals,
        portfolio_annual: &[AnnualReturnRecord],
    ) -> Result<PortfolioResult, AnalyticsError> {
        if totals.month_count == 0 {
            return Err(AnalyticsError::NotEnoughData(
                "the window spans no months".to_string(),
            ));
        }

        let total_return_pct = total_return_pct(totals)
            .ok_or_else(|| AnalyticsError::DivisionByZero("total_return_pct".to_string()))?;

        let years = Decimal::from(totals.month_count) / Decimal::from(12);
        let annualized_return_pct = totals
            .final_amount
            .checked_div(totals.initial_amount)
            .and_then(|factor| annualized_return_pct(factor, years));

        let risk = self.risk.evaluate(annualized_return_pct, portfolio_annual);

        Ok(PortfolioResult {
            initial_amount: totals.initial_amount,
            final_amount: totals.final_amount,
            cumulative_investment: totals.cumulative_investment,
            total_return_pct,
            annualized_return_pct,
            standard_deviation_pct: risk.standard_deviation_pct,
            max_return_year: risk.max_return_year,
            min_return_year: risk.min_return_year,
            sharpe_ratio: risk.sharpe_ratio,
            sortino_ratio: risk.sortino_ratio,
        })
    }
}

/// Gain over everything paid in, in percent. `None` when nothing was invested.
fn total_return_pct(totals: &GrowthTotals) -> Option<Decimal> {
    if totals.cumulative_investment.is_zero() {
        return None;
    }
    (totals.final_amount - totals.cumulative_investment)
        .checked_div(totals.cumulative_investment)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
