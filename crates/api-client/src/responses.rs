use crate::error::ApiError;
use chrono::NaiveDate;
use core_types::PricePoint;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

// Alpha Vantage keys carry a numeric prefix ("5. adjusted close"), so every
// field is renamed explicitly.

/// The body of a `TIME_SERIES_MONTHLY_ADJUSTED` query.
///
/// On throttling or an unknown symbol the API still answers 200 with one of
/// the message fields set and no series.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyAdjustedResponse {
    #[serde(rename = "Monthly Adjusted Time Series")]
    pub series: Option<BTreeMap<String, MonthlyBar>>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

/// One month of a monthly adjusted series. Only the adjusted close is used.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyBar {
    #[serde(rename = "5. adjusted close")]
    pub adjusted_close: String,
}

/// The body of a `CURRENCY_EXCHANGE_RATE` query.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    pub rate: Option<ExchangeRate>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRate {
    #[serde(rename = "1. From_Currency Code")]
    pub from_currency: String,
    #[serde(rename = "3. To_Currency Code")]
    pub to_currency: String,
    #[serde(rename = "5. Exchange Rate")]
    pub exchange_rate: String,
}

impl MonthlyAdjustedResponse {
    /// Converts the response into raw observations for `symbol`.
    ///
    /// A response without a series, or with an empty one, is `DataUnavailable`.
    pub fn into_points(self, symbol: &str) -> Result<Vec<PricePoint>, ApiError> {
        let series = match self.series {
            Some(series) if !series.is_empty() => series,
            _ => {
                let reason = self
                    .error_message
                    .or(self.note)
                    .or(self.information)
                    .unwrap_or_else(|| "response contained no monthly series".to_string());
                return Err(ApiError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason,
                });
            }
        };

        series
            .into_iter()
            .map(|(date, bar)| {
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|e| ApiError::InvalidData(format!("Invalid date '{}': {}", date, e)))?;
                let close = Decimal::from_str(bar.adjusted_close.trim())
                    .map_err(|e| ApiError::Deserialization(e.to_string()))?;
                Ok(PricePoint::new(date, close))
            })
            .collect()
    }
}

impl ExchangeRateResponse {
    pub fn into_rate(self, base: &str, quote: &str) -> Result<Decimal, ApiError> {
        let rate = self.rate.ok_or_else(|| {
            ApiError::ApiError(
                self.error_message
                    .or(self.note)
                    .unwrap_or_else(|| format!("no exchange rate returned for {base}/{quote}")),
            )
        })?;
        if !rate.from_currency.eq_ignore_ascii_case(base)
            || !rate.to_currency.eq_ignore_ascii_case(quote)
        {
            return Err(ApiError::InvalidData(format!(
                "asked for {base}/{quote}, got {}/{}",
                rate.from_currency, rate.to_currency
            )));
        }
        Decimal::from_str(rate.exchange_rate.trim())
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}
