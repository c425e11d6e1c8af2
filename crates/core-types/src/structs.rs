use crate::enums::GrowthSource;
use crate::error::CoreError;
use crate::month::MonthKey;
use crate::series::PriceSeries;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Symbol used for the allocation-weighted aggregate in annual return records.
pub const PORTFOLIO_SYMBOL: &str = "PORTFOLIO";

/// One line of the target allocation: a symbol and its percentage weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    /// Percentage of invested capital, 0 to 100.
    pub allocation: Decimal,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, allocation: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            allocation,
        }
    }

    /// `amount` scaled by this holding's weight. `None` if the product
    /// does not fit in a `Decimal`.
    pub fn share_of(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.allocation.checked_div(Decimal::ONE_HUNDRED)?)
    }
}

/// Parses the `SYMBOL=PERCENT` form used on the command line.
impl FromStr for Holding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, allocation) = s.split_once('=').ok_or_else(|| {
            CoreError::InvalidAllocation(format!("expected SYMBOL=PERCENT, got '{s}'"))
        })?;
        let allocation = Decimal::from_str(allocation.trim()).map_err(|_| {
            CoreError::InvalidAllocation(format!(
                "allocation for '{}' is not a number: '{}'",
                symbol.trim(),
                allocation.trim()
            ))
        })?;
        Ok(Holding::new(symbol.trim().to_uppercase(), allocation))
    }
}

/// The immutable input of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub holdings: Vec<Holding>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_amount: Decimal,
    pub monthly_contribution: Decimal,
}

impl PortfolioConfig {
    pub fn start_month(&self) -> MonthKey {
        MonthKey::from_date(self.start_date)
    }

    pub fn end_month(&self) -> MonthKey {
        MonthKey::from_date(self.end_date)
    }

    /// Number of calendar months in the window, both ends included.
    pub fn month_count(&self) -> i64 {
        self.start_month().months_until(self.end_month()) + 1
    }

    /// The same window and amounts, restricted to `holdings`.
    pub fn with_holdings(&self, holdings: Vec<Holding>) -> Self {
        Self {
            holdings,
            ..self.clone()
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }
}

/// A holding paired with its normalized price history.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub holding: Holding,
    pub prices: PriceSeries,
}

impl Instrument {
    pub fn symbol(&self) -> &str {
        &self.holding.symbol
    }

    pub fn allocation(&self) -> Decimal {
        self.holding.allocation
    }
}

/// One holding's value at the end of a simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValue {
    pub symbol: String,
    pub value: Decimal,
    pub growth_rate: Decimal,
    pub source: GrowthSource,
}

/// The portfolio's value at the end of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub month: MonthKey,
    pub value: Decimal,
    pub holdings: Vec<HoldingValue>,
}

/// The return of one symbol (or of the weighted aggregate) over a calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReturnRecord {
    pub year: i32,
    pub symbol: String,
    pub return_pct: Decimal,
}
