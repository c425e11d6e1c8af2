use chrono::NaiveDate;
use core_types::{
    AnnualReturnRecord, BacktestWarning, Instrument, MonthKey, PortfolioConfig, PORTFOLIO_SYMBOL,
};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-year returns for every instrument and for the weighted portfolio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnualReturns {
    /// Instrument records, in portfolio order, years ascending.
    pub records: Vec<AnnualReturnRecord>,
    /// Allocation-weighted aggregate, one record per year with any instrument record.
    pub portfolio: Vec<AnnualReturnRecord>,
    /// Years skipped for having a single observation.
    pub warnings: Vec<BacktestWarning>,
}

/// Window-level figures for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub allocation: Decimal,
    pub start_date: NaiveDate,
    pub start_price: Decimal,
    pub end_date: NaiveDate,
    pub end_price: Decimal,
    pub simple_return_pct: Option<Decimal>,
    pub annualized_return_pct: Option<Decimal>,
    pub initial_investment: Decimal,
    pub final_value: Option<Decimal>,
}

impl InstrumentSummary {
    /// Returns a copy with the invested amounts multiplied by `rate`, or `None`
    /// if a converted amount would overflow.
    /// Prices stay in the currency they were quoted in.
    pub fn converted(&self, rate: Decimal) -> Option<Self> {
        let final_value = match self.final_value {
            Some(v) => Some(v.checked_mul(rate)?),
            None => None,
        };
        Some(Self {
            initial_investment: self.initial_investment.checked_mul(rate)?,
            final_value,
            ..self.clone()
        })
    }
}

/// Percentage change from `start` to `end`. `None` for a non-positive start.
pub fn simple_return_pct(start: Decimal, end: Decimal) -> Option<Decimal> {
    if start <= Decimal::ZERO {
        return None;
    }
    (end - start)
        .checked_div(start)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
}

/// Compound annual growth rate in percent for a total `growth_factor` over `years`.
///
/// `None` when the duration is not positive, the factor is negative, or the
/// power cannot be represented.
pub fn annualized_return_pct(growth_factor: Decimal, years: Decimal) -> Option<Decimal> {
    if years <= Decimal::ZERO || growth_factor.is_sign_negative() {
        return None;
    }
    if growth_factor.is_zero() {
        return Some(-Decimal::ONE_HUNDRED);
    }
    let exponent = Decimal::ONE.checked_div(years)?;
    let compounded = growth_factor.checked_powd(exponent)?;
    (compounded - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED)
}

/// Derives per-year and window returns from normalized price tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnAnalyzer {}

impl ReturnAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds annual return records for calendar years `start_year..=end_year`.
    ///
    /// A year needs at least two monthly observations; the return runs from
    /// the first to the last of them, whatever months those are.
    pub fn annual_returns(
        &self,
        instruments: &[Instrument],
        start_year: i32,
        end_year: i32,
    ) -> AnnualReturns {
        let mut out = AnnualReturns::default();
        let mut weighted: BTreeMap<i32, Decimal> = BTreeMap::new();

        for instrument in instruments {
            for year in start_year..=end_year {
                let closes = instrument.prices.closes_in_year(year);
                match closes.as_slice() {
                    [] => continue,
                    [_] => {
                        out.warnings.push(BacktestWarning::InsufficientHistory {
                            symbol: instrument.symbol().to_string(),
                            year,
                            observations: 1,
                        });
                    }
                    [(_, first), .., (_, last)] => {
                        let Some(return_pct) = simple_return_pct(*first, *last) else {
                            tracing::debug!(
                                symbol = instrument.symbol(),
                                year,
                                "Skipping annual return with a non-positive opening price."
                            );
                            continue;
                        };
                        *weighted.entry(year).or_default() +=
                            return_pct * instrument.allocation() / Decimal::ONE_HUNDRED;
                        out.records.push(AnnualReturnRecord {
                            year,
                            symbol: instrument.symbol().to_string(),
                            return_pct,
                        });
                    }
                }
            }
        }

        out.portfolio = weighted
            .into_iter()
            .map(|(year, return_pct)| AnnualReturnRecord {
                year,
                symbol: PORTFOLIO_SYMBOL.to_string(),
                return_pct,
            })
            .collect();

        out
    }

    /// Start/end prices at the observations closest to the window bounds, and
    /// the returns between them.
    pub fn instrument_summary(
        &self,
        instrument: &Instrument,
        config: &PortfolioConfig,
    ) -> Option<InstrumentSummary> {
        let start = instrument.prices.closest_date(config.start_date)?;
        let end = instrument.prices.closest_date(config.end_date)?;

        let simple = simple_return_pct(start.close, end.close);
        let months = MonthKey::from_date(start.date).months_until(MonthKey::from_date(end.date));
        let annualized = if start.close > Decimal::ZERO {
            let years = Decimal::from(months) / Decimal::from(12);
            annualized_return_pct(end.close / start.close, years)
        } else {
            None
        };

        let initial_investment = instrument.holding.share_of(config.initial_amount)?;
        let final_value = simple.and_then(|r| {
            initial_investment.checked_mul(Decimal::ONE + r / Decimal::ONE_HUNDRED)
        });

        Some(InstrumentSummary {
            symbol: instrument.symbol().to_string(),
            allocation: instrument.allocation(),
            start_date: start.date,
            start_price: start.close,
            end_date: end.date,
            end_price: end.close,
            simple_return_pct: simple,
            annualized_return_pct: annualized,
            initial_investment,
            final_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Holding, PricePoint, PriceSeries};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instrument(
        symbol: &str,
        allocation: Decimal,
        closes: &[((i32, u32), Decimal)],
    ) -> Instrument {
        let points = closes
            .iter()
            .map(|((y, m), c)| PricePoint::new(date(*y, *m, 1), *c))
            .collect();
        Instrument {
            holding: Holding::new(symbol, allocation),
            prices: PriceSeries::from_observations(symbol, points).unwrap(),
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.000001),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn annual_return_uses_first_and_last_observation() {
        let a = instrument(
            "A",
            dec!(100),
            &[((2020, 3), dec!(100)), ((2020, 6), dec!(90)), ((2020, 9), dec!(120))],
        );
        let returns = ReturnAnalyzer::new().annual_returns(&[a], 2020, 2020);

        assert_eq!(returns.records.len(), 1);
        assert_eq!(returns.records[0].return_pct, dec!(20));
        assert_eq!(returns.portfolio[0].symbol, PORTFOLIO_SYMBOL);
        assert_eq!(returns.portfolio[0].return_pct, dec!(20));
    }

    #[test]
    fn single_observation_year_is_omitted_with_warning() {
        let a = instrument(
            "A",
            dec!(100),
            &[((2019, 12), dec!(100)), ((2020, 1), dec!(100)), ((2020, 12), dec!(110))],
        );
        let returns = ReturnAnalyzer::new().annual_returns(&[a], 2019, 2020);

        assert_eq!(returns.records.len(), 1);
        assert_eq!(returns.records[0].year, 2020);
        assert_eq!(
            returns.warnings,
            vec![BacktestWarning::InsufficientHistory {
                symbol: "A".to_string(),
                year: 2019,
                observations: 1,
            }]
        );
    }

    #[test]
    fn years_outside_window_are_ignored() {
        let a = instrument(
            "A",
            dec!(100),
            &[
                ((2018, 1), dec!(50)),
                ((2018, 12), dec!(60)),
                ((2020, 1), dec!(100)),
                ((2020, 12), dec!(100)),
            ],
        );
        let returns = ReturnAnalyzer::new().annual_returns(&[a], 2020, 2020);
        assert_eq!(returns.records.len(), 1);
        assert_eq!(returns.records[0].year, 2020);
    }

    #[test]
    fn portfolio_return_is_weighted_without_renormalization() {
        let a = instrument("A", dec!(50), &[((2020, 1), dec!(100)), ((2020, 12), dec!(110))]);
        let b = instrument("B", dec!(50), &[((2020, 1), dec!(100)), ((2020, 12), dec!(90))]);
        // C only has data for 2021.
        let c = instrument("C", dec!(50), &[((2021, 1), dec!(100)), ((2021, 12), dec!(120))]);

        let returns = ReturnAnalyzer::new().annual_returns(&[a, b, c], 2020, 2021);

        let portfolio: Vec<_> = returns.portfolio.iter().map(|r| (r.year, r.return_pct)).collect();
        assert_eq!(portfolio, vec![(2020, dec!(0)), (2021, dec!(10))]);
    }

    #[test]
    fn summary_uses_closest_observations() {
        let a = instrument(
            "A",
            dec!(40),
            &[((2020, 1), dec!(100)), ((2020, 7), dec!(150)), ((2021, 1), dec!(200))],
        );
        let config = PortfolioConfig {
            holdings: vec![a.holding.clone()],
            start_date: date(2020, 1, 3),
            end_date: date(2020, 12, 28),
            initial_amount: dec!(1000),
            monthly_contribution: dec!(0),
        };

        let summary = ReturnAnalyzer::new().instrument_summary(&a, &config).unwrap();
        assert_eq!(summary.start_price, dec!(100));
        assert_eq!(summary.end_price, dec!(200));
        assert_eq!(summary.simple_return_pct, Some(dec!(100)));
        assert_close(summary.annualized_return_pct.unwrap(), dec!(100));
        assert_eq!(summary.initial_investment, dec!(400));
        assert_eq!(summary.final_value, Some(dec!(800)));
    }

    #[test]
    fn zero_duration_has_no_annualized_return() {
        assert_eq!(annualized_return_pct(dec!(1.5), Decimal::ZERO), None);
        assert_eq!(annualized_return_pct(Decimal::ZERO, dec!(1)), Some(dec!(-100)));
        assert_eq!(simple_return_pct(Decimal::ZERO, dec!(10)), None);
    }

    #[test]
    fn two_year_growth_compounds() {
        // 1.21 over two years is 10% a year.
        assert_close(annualized_return_pct(dec!(1.21), dec!(2)).unwrap(), dec!(10));
    }
}
