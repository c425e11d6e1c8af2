use core_types::AnnualReturnRecord;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Annual risk-free rate, in percent, used when none is configured.
pub const DEFAULT_RISK_FREE_RATE_PCT: Decimal = dec!(2);

/// Dispersion and risk-adjusted figures over a series of annual returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub standard_deviation_pct: Option<Decimal>,
    pub max_return_year: Option<AnnualReturnRecord>,
    pub min_return_year: Option<AnnualReturnRecord>,
    pub sharpe_ratio: Option<Decimal>, // None when the standard deviation is zero or missing
    pub sortino_ratio: Option<Decimal>, // None without a losing year
}

/// Risk calculator parameterized by the risk-free rate.
///
/// All returns are percentages; ratios are computed on fractions, which leaves
/// them unit-free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetrics {
    risk_free_rate_pct: Decimal,
}

impl Default for RiskMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE_PCT)
    }
}

impl RiskMetrics {
    pub fn new(risk_free_rate_pct: Decimal) -> Self {
        Self { risk_free_rate_pct }
    }

    /// Computes every metric for `records` given the window's annualized return.
    pub fn evaluate(
        &self,
        annualized_return_pct: Option<Decimal>,
        records: &[AnnualReturnRecord],
    ) -> RiskReport {
        let standard_deviation_pct = standard_deviation_pct(records);
        let (max_return_year, min_return_year) = best_and_worst(records);

        RiskReport {
            standard_deviation_pct,
            max_return_year: max_return_year.cloned(),
            min_return_year: min_return_year.cloned(),
            sharpe_ratio: self.sharpe_ratio(annualized_return_pct, standard_deviation_pct),
            sortino_ratio: self.sortino_ratio(annualized_return_pct, records),
        }
    }

    /// Excess return over the risk-free rate per unit of total dispersion.
    pub fn sharpe_ratio(
        &self,
        annualized_return_pct: Option<Decimal>,
        standard_deviation_pct: Option<Decimal>,
    ) -> Option<Decimal> {
        let std_dev = standard_deviation_pct.filter(|s| !s.is_zero())? / Decimal::ONE_HUNDRED;
        self.excess_return(annualized_return_pct?)?.checked_div(std_dev)
    }

    /// Excess return over the risk-free rate per unit of downside deviation.
    pub fn sortino_ratio(
        &self,
        annualized_return_pct: Option<Decimal>,
        records: &[AnnualReturnRecord],
    ) -> Option<Decimal> {
        let downside =
            downside_deviation_pct(records).filter(|d| !d.is_zero())? / Decimal::ONE_HUNDRED;
        self.excess_return(annualized_return_pct?)?.checked_div(downside)
    }

    fn excess_return(&self, annualized_return_pct: Decimal) -> Option<Decimal> {
        (annualized_return_pct - self.risk_free_rate_pct).checked_div(Decimal::ONE_HUNDRED)
    }
}

/// Population standard deviation of the annual returns, in percent.
///
/// Divides by N: the observed years are the whole population, not a sample.
pub fn standard_deviation_pct(records: &[AnnualReturnRecord]) -> Option<Decimal> {
    if records.is_empty() {
        return None;
    }
    let n = Decimal::from(records.len());
    let fractions: Vec<Decimal> = records
        .iter()
        .map(|r| r.return_pct / Decimal::ONE_HUNDRED)
        .collect();

    let mean = fractions.iter().sum::<Decimal>() / n;
    let variance = fractions
        .iter()
        .map(|r| (*r - mean) * (*r - mean))
        .sum::<Decimal>()
        / n;

    variance.sqrt().map(|s| s * Decimal::ONE_HUNDRED)
}

/// Root-mean-square of the strictly negative annual returns, in percent.
pub fn downside_deviation_pct(records: &[AnnualReturnRecord]) -> Option<Decimal> {
    let squares: Vec<Decimal> = records
        .iter()
        .filter(|r| r.return_pct < Decimal::ZERO)
        .map(|r| r.return_pct / Decimal::ONE_HUNDRED)
        .map(|r| r * r)
        .collect();

    if squares.is_empty() {
        return None;
    }
    let mean = squares.iter().sum::<Decimal>() / Decimal::from(squares.len());
    mean.sqrt().map(|d| d * Decimal::ONE_HUNDRED)
}

/// The records with the highest and lowest return. The first one seen wins a tie.
pub fn best_and_worst(
    records: &[AnnualReturnRecord],
) -> (Option<&AnnualReturnRecord>, Option<&AnnualReturnRecord>) {
    let mut best: Option<&AnnualReturnRecord> = None;
    let mut worst: Option<&AnnualReturnRecord> = None;

    for record in records {
        if best.is_none_or(|b| record.return_pct > b.return_pct) {
            best = Some(record);
        }
        if worst.is_none_or(|w| record.return_pct < w.return_pct) {
            worst = Some(record);
        }
    }

    (best, worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PORTFOLIO_SYMBOL;

    fn records(returns: &[(i32, Decimal)]) -> Vec<AnnualReturnRecord> {
        returns
            .iter()
            .map(|(year, r)| AnnualReturnRecord {
                year: *year,
                symbol: PORTFOLIO_SYMBOL.to_string(),
                return_pct: *r,
            })
            .collect()
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.000001),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn population_standard_deviation() {
        // Fractions 0.1 and -0.1: mean 0, population variance 0.01.
        let std = standard_deviation_pct(&records(&[(2020, dec!(10)), (2021, dec!(-10))])).unwrap();
        assert_close(std, dec!(10));
    }

    #[test]
    fn empty_series_has_no_metrics() {
        let report = RiskMetrics::default().evaluate(Some(dec!(5)), &[]);
        assert_eq!(report, RiskReport::default());
    }

    #[test]
    fn equal_returns_leave_sharpe_undefined() {
        let series = records(&[(2019, dec!(7)), (2020, dec!(7)), (2021, dec!(7))]);
        let report = RiskMetrics::default().evaluate(Some(dec!(7)), &series);

        assert_eq!(report.standard_deviation_pct, Some(Decimal::ZERO));
        assert_eq!(report.sharpe_ratio, None);
    }

    #[test]
    fn sharpe_uses_configured_risk_free_rate() {
        let series = records(&[(2020, dec!(10)), (2021, dec!(-10))]);

        let default_rate = RiskMetrics::default().evaluate(Some(dec!(12)), &series);
        assert_close(default_rate.sharpe_ratio.unwrap(), dec!(1));

        let zero_rate = RiskMetrics::new(Decimal::ZERO).evaluate(Some(dec!(12)), &series);
        assert_close(zero_rate.sharpe_ratio.unwrap(), dec!(1.2));
    }

    #[test]
    fn no_losing_year_leaves_sortino_undefined() {
        let series = records(&[(2020, dec!(3)), (2021, dec!(0)), (2022, dec!(12))]);
        assert_eq!(RiskMetrics::default().sortino_ratio(Some(dec!(5)), &series), None);
    }

    #[test]
    fn sortino_uses_only_negative_years() {
        // Downside: -0.1 and -0.3, mean square 0.05.
        let series = records(&[(2019, dec!(-10)), (2020, dec!(25)), (2021, dec!(-30))]);
        let downside = downside_deviation_pct(&series).unwrap();
        assert_close(downside * downside, dec!(500));

        let sortino = RiskMetrics::new(Decimal::ZERO)
            .sortino_ratio(Some(dec!(10)), &series)
            .unwrap();
        assert_close(sortino * downside, dec!(10));
    }

    #[test]
    fn best_and_worst_keep_first_on_tie() {
        let series = records(&[
            (2019, dec!(5)),
            (2020, dec!(9)),
            (2021, dec!(9)),
            (2022, dec!(-4)),
        ]);
        let (best, worst) = best_and_worst(&series);

        assert_eq!(best.unwrap().year, 2020);
        assert_eq!(worst.unwrap().year, 2022);
        assert_eq!(best_and_worst(&[]), (None, None));
    }

    #[test]
    fn missing_annualized_return_leaves_ratios_undefined() {
        let series = records(&[(2020, dec!(10)), (2021, dec!(-10))]);
        let report = RiskMetrics::default().evaluate(None, &series);

        assert!(report.standard_deviation_pct.is_some());
        assert_eq!(report.sharpe_ratio, None);
        assert_eq!(report.sortino_ratio, None);
    }
}
