use crate::error::SimulationError;
use analytics::GrowthTotals;
use core_types::{
    BacktestWarning, GrowthSource, HoldingValue, Instrument, MissingPricePolicy, MonthKey,
    MonthlySnapshot, PortfolioConfig, PriceSeries,
};
use rust_decimal::Decimal;

pub mod error;

/// The month-by-month value path of a portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthTrajectory {
    /// One snapshot per calendar month of the window, contiguous.
    pub snapshots: Vec<MonthlySnapshot>,
    pub totals: GrowthTotals,
    /// One `MissingPrice` entry per holding and month that fell back to zero growth.
    pub warnings: Vec<BacktestWarning>,
}

/// Compounds each holding's value month by month from observed price changes.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrowthSimulator {
    policy: MissingPricePolicy,
}

/// A holding's running state inside the simulation loop.
struct Position<'a> {
    instrument: &'a Instrument,
    value: Decimal,
    contribution: Decimal,
}

impl GrowthSimulator {
    pub fn new(policy: MissingPricePolicy) -> Self {
        Self { policy }
    }

    /// Runs the simulation over the window of `config` for `instruments`.
    ///
    /// Each holding starts at `initial_amount x allocation / 100` and receives
    /// `monthly_contribution x allocation / 100` at the start of every month,
    /// before that month's growth is applied. The growth of month `m` is the
    /// change from the close of `m` to the close of the month after it.
    pub fn simulate(
        &self,
        config: &PortfolioConfig,
        instruments: &[Instrument],
    ) -> Result<GrowthTrajectory, SimulationError> {
        let (start, end) = (config.start_month(), config.end_month());
        let month_count = u32::try_from(config.month_count())
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                SimulationError::InvalidWindow(format!("{start} to {end} spans no months"))
            })?;
        if instruments.is_empty() {
            return Err(SimulationError::NoInstruments);
        }

        let mut positions = Vec::with_capacity(instruments.len());
        for instrument in instruments {
            let share = |amount: Decimal| {
                let symbol = instrument.symbol();
                instrument.holding.share_of(amount).ok_or_else(|| {
                    SimulationError::Overflow(format!("{symbol} share of {amount}"))
                })
            };
            positions.push(Position {
                instrument,
                value: share(config.initial_amount)?,
                contribution: share(config.monthly_contribution)?,
            });
        }

        let mut snapshots = Vec::with_capacity(month_count as usize);
        let mut warnings = Vec::new();

        for month in MonthKey::range_inclusive(start, end) {
            let mut holdings = Vec::with_capacity(positions.len());

            for position in positions.iter_mut() {
                let symbol = position.instrument.symbol();
                let (growth_rate, source) = self.growth_rate(&position.instrument.prices, month);

                if source == GrowthSource::Fallback {
                    tracing::debug!(symbol, %month, "No usable close, applying zero growth.");
                    warnings.push(BacktestWarning::MissingPrice {
                        symbol: symbol.to_string(),
                        month,
                    });
                }

                position.value = position
                    .value
                    .checked_add(position.contribution)
                    .zip(Decimal::ONE.checked_add(growth_rate))
                    .and_then(|(v, factor)| v.checked_mul(factor))
                    .ok_or_else(|| {
                        SimulationError::Overflow(format!("{symbol} value in {month}"))
                    })?;
                holdings.push(HoldingValue {
                    symbol: symbol.to_string(),
                    value: position.value,
                    growth_rate,
                    source,
                });
            }

            let value = checked_sum(holdings.iter().map(|h| h.value)).ok_or_else(|| {
                SimulationError::Overflow(format!("portfolio value in {month}"))
            })?;
            snapshots.push(MonthlySnapshot {
                month,
                value,
                holdings,
            });
        }

        let final_amount = checked_sum(positions.iter().map(|p| p.value))
            .ok_or_else(|| SimulationError::Overflow("final amount".to_string()))?;
        let cumulative_investment = checked_sum(positions.iter().map(|p| p.contribution))
            .and_then(|c| c.checked_mul(Decimal::from(month_count)))
            .and_then(|c| c.checked_add(config.initial_amount))
            .ok_or_else(|| SimulationError::Overflow("cumulative investment".to_string()))?;
        let totals = GrowthTotals {
            initial_amount: config.initial_amount,
            final_amount,
            cumulative_investment,
            month_count,
        };

        tracing::debug!(
            months = month_count,
            final_amount = %totals.final_amount,
            fallbacks = warnings.len(),
            "Growth simulation complete."
        );

        Ok(GrowthTrajectory {
            snapshots,
            totals,
            warnings,
        })
    }

    /// Growth from `month` to the following month, and where it came from.
    fn growth_rate(&self, prices: &PriceSeries, month: MonthKey) -> (Decimal, GrowthSource) {
        let (current, current_carried) = self.resolve_price(prices, month);
        let (next, next_carried) = self.resolve_price(prices, month.next());

        let rate = match (current, next) {
            (Some(current), Some(next)) => (next - current).checked_div(current),
            _ => None,
        };

        match rate {
            Some(rate) if current_carried || next_carried => (rate, GrowthSource::CarriedForward),
            Some(rate) => (rate, GrowthSource::Observed),
            None => (Decimal::ZERO, GrowthSource::Fallback),
        }
    }

    /// The usable close for `month` under the configured policy, and whether
    /// it was carried forward from an earlier month.
    fn resolve_price(&self, prices: &PriceSeries, month: MonthKey) -> (Option<Decimal>, bool) {
        if let Some(close) = prices.price(month).filter(|c| *c > Decimal::ZERO) {
            return (Some(close), false);
        }
        match self.policy {
            MissingPricePolicy::ZeroGrowth => (None, false),
            MissingPricePolicy::CarryForward => {
                let carried = prices.last_price_at_or_before(month);
                (carried, carried.is_some())
            }
        }
    }
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}
