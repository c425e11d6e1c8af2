use crate::error::CoreError;
use crate::month::MonthKey;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single adjusted-close observation as delivered by a price provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: Decimal) -> Self {
        Self { date, close }
    }
}

/// A normalized, month-keyed close-price table for one symbol.
///
/// Raw observations may arrive unordered and at any granularity. They are
/// sorted by date (stable, so same-day duplicates keep their delivery order)
/// and folded into one close per month, the latest observation in the month
/// winning.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    observations: Vec<PricePoint>,
    monthly: BTreeMap<MonthKey, Decimal>,
}

impl PriceSeries {
    /// Normalizes raw provider observations.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DataUnavailable` when `points` is empty.
    pub fn from_observations(
        symbol: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if points.is_empty() {
            return Err(CoreError::DataUnavailable(symbol));
        }

        points.sort_by_key(|p| p.date);

        let mut monthly = BTreeMap::new();
        for point in &points {
            monthly.insert(MonthKey::from_date(point.date), point.close);
        }

        tracing::debug!(
            symbol = %symbol,
            observations = points.len(),
            months = monthly.len(),
            "Normalized price series."
        );

        Ok(Self {
            symbol,
            observations: points,
            monthly,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Observations in ascending date order.
    pub fn observations(&self) -> &[PricePoint] {
        &self.observations
    }

    /// The month-keyed close table.
    pub fn monthly(&self) -> &BTreeMap<MonthKey, Decimal> {
        &self.monthly
    }

    /// The close recorded for `month`, if any.
    pub fn price(&self, month: MonthKey) -> Option<Decimal> {
        self.monthly.get(&month).copied()
    }

    /// The most recent positive close at or before `month`.
    pub fn last_price_at_or_before(&self, month: MonthKey) -> Option<Decimal> {
        self.monthly
            .range(..=month)
            .rev()
            .map(|(_, close)| *close)
            .find(|close| *close > Decimal::ZERO)
    }

    /// Month-keyed closes that fall in calendar `year`, oldest first.
    pub fn closes_in_year(&self, year: i32) -> Vec<(MonthKey, Decimal)> {
        let (Some(first), Some(last)) = (MonthKey::new(year, 1), MonthKey::new(year, 12)) else {
            return Vec::new();
        };
        self.monthly
            .range(first..=last)
            .map(|(month, close)| (*month, *close))
            .collect()
    }

    /// The observation whose date is nearest to `target`.
    ///
    /// Distance is measured in whole days. On a tie the earlier date wins,
    /// which is what a left-to-right scan keeping the first minimum would pick.
    pub fn closest_date(&self, target: NaiveDate) -> Option<&PricePoint> {
        let idx = self.observations.partition_point(|p| p.date < target);

        let after = self.observations.get(idx);
        let before = idx
            .checked_sub(1)
            .and_then(|i| self.observations.get(i))
            .map(|p| self.first_on(p.date));

        match (before, after) {
            (Some(b), Some(a)) => {
                let before_gap = (target - b.date).num_days();
                let after_gap = (a.date - target).num_days();
                if after_gap < before_gap { Some(a) } else { Some(b) }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// The first observation carrying exactly `date`.
    fn first_on(&self, date: NaiveDate) -> &PricePoint {
        let idx = self.observations.partition_point(|p| p.date < date);
        &self.observations[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn empty_observations_are_unavailable() {
        let err = PriceSeries::from_observations("VTI", vec![]).unwrap_err();
        assert_eq!(err, CoreError::DataUnavailable("VTI".to_string()));
    }

    #[test]
    fn unordered_input_is_sorted() {
        let series = PriceSeries::from_observations(
            "VTI",
            vec![
                PricePoint::new(date(2020, 3, 31), dec!(3)),
                PricePoint::new(date(2020, 1, 31), dec!(1)),
                PricePoint::new(date(2020, 2, 28), dec!(2)),
            ],
        )
        .unwrap();

        let dates: Vec<_> = series.observations().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2020, 1, 31), date(2020, 2, 28), date(2020, 3, 31)]);
        let keys: Vec<_> = series.monthly().keys().copied().collect();
        assert_eq!(keys, vec![month("2020-01"), month("2020-02"), month("2020-03")]);
    }

    #[test]
    fn latest_observation_in_month_wins() {
        let series = PriceSeries::from_observations(
            "VTI",
            vec![
                PricePoint::new(date(2020, 1, 31), dec!(105)),
                PricePoint::new(date(2020, 1, 2), dec!(100)),
                PricePoint::new(date(2020, 1, 15), dec!(102)),
            ],
        )
        .unwrap();

        assert_eq!(series.monthly().len(), 1);
        assert_eq!(series.price(month("2020-01")), Some(dec!(105)));
    }

    #[test]
    fn closest_date_picks_nearest() {
        let series = PriceSeries::from_observations(
            "VTI",
            vec![
                PricePoint::new(date(2020, 1, 31), dec!(1)),
                PricePoint::new(date(2020, 2, 28), dec!(2)),
                PricePoint::new(date(2020, 3, 31), dec!(3)),
            ],
        )
        .unwrap();

        assert_eq!(series.closest_date(date(2020, 2, 1)).unwrap().close, dec!(1));
        assert_eq!(series.closest_date(date(2020, 3, 20)).unwrap().close, dec!(3));
        assert_eq!(series.closest_date(date(2019, 1, 1)).unwrap().close, dec!(1));
        assert_eq!(series.closest_date(date(2025, 1, 1)).unwrap().close, dec!(3));
        assert_eq!(series.closest_date(date(2020, 2, 28)).unwrap().close, dec!(2));
    }

    #[test]
    fn closest_date_tie_prefers_earlier() {
        let series = PriceSeries::from_observations(
            "VTI",
            vec![
                PricePoint::new(date(2020, 1, 10), dec!(1)),
                PricePoint::new(date(2020, 1, 20), dec!(2)),
            ],
        )
        .unwrap();

        assert_eq!(series.closest_date(date(2020, 1, 15)).unwrap().close, dec!(1));
    }

    #[test]
    fn last_price_skips_gaps_and_non_positive() {
        let series = PriceSeries::from_observations(
            "VTI",
            vec![
                PricePoint::new(date(2020, 1, 31), dec!(50)),
                PricePoint::new(date(2020, 3, 31), dec!(0)),
            ],
        )
        .unwrap();

        assert_eq!(series.last_price_at_or_before(month("2020-02")), Some(dec!(50)));
        assert_eq!(series.last_price_at_or_before(month("2020-04")), Some(dec!(50)));
        assert_eq!(series.last_price_at_or_before(month("2019-12")), None);
    }

    #[test]
    fn closes_in_year_stay_in_year() {
        let series = PriceSeries::from_observations(
            "VTI",
            vec![
                PricePoint::new(date(2019, 12, 31), dec!(9)),
                PricePoint::new(date(2020, 1, 31), dec!(10)),
                PricePoint::new(date(2020, 12, 31), dec!(12)),
                PricePoint::new(date(2021, 1, 29), dec!(13)),
            ],
        )
        .unwrap();

        let closes = series.closes_in_year(2020);
        assert_eq!(closes, vec![(month("2020-01"), dec!(10)), (month("2020-12"), dec!(12))]);
    }
}
