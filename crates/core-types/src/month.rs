use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, the engine's unit of time.
///
/// Keys order chronologically and render as `YYYY-MM`, which is also the
/// format they are parsed from and serialized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a key, returning `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month immediately following this one.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Signed number of months from `self` to `other` (`other - self`).
    pub fn months_until(&self, other: MonthKey) -> i64 {
        (other.year as i64 - self.year as i64) * 12 + (other.month as i64 - self.month as i64)
    }

    /// Iterates every month from `start` to `end`, both inclusive.
    /// Yields nothing when `end` precedes `start`.
    pub fn range_inclusive(start: MonthKey, end: MonthKey) -> impl Iterator<Item = MonthKey> {
        let mut current = Some(start).filter(|s| *s <= end);
        std::iter::from_fn(move || {
            let month = current?;
            let next = month.next();
            current = (next <= end).then_some(next);
            Some(month)
        })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput("month key".to_string(), s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(MonthKey::new(2020, 3).unwrap().to_string(), "2020-03");
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(MonthKey::new(2020, 13).is_none());
        assert!("2020-00".parse::<MonthKey>().is_err());
        assert!("2020".parse::<MonthKey>().is_err());
    }

    #[test]
    fn next_rolls_over_december() {
        assert_eq!(key("2019-12").next(), key("2020-01"));
        assert_eq!(key("2020-05").next(), key("2020-06"));
    }

    #[test]
    fn months_until_spans_years() {
        assert_eq!(key("2020-01").months_until(key("2021-01")), 12);
        assert_eq!(key("2020-11").months_until(key("2021-02")), 3);
        assert_eq!(key("2021-02").months_until(key("2020-11")), -3);
    }

    #[test]
    fn inclusive_range_has_no_gaps() {
        let months: Vec<_> = MonthKey::range_inclusive(key("2019-11"), key("2020-02")).collect();
        assert_eq!(
            months,
            vec![key("2019-11"), key("2019-12"), key("2020-01"), key("2020-02")]
        );
        assert_eq!(MonthKey::range_inclusive(key("2020-02"), key("2020-01")).count(), 0);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&key("2021-07")).unwrap();
        assert_eq!(json, "\"2021-07\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2021-07"));
    }
}
