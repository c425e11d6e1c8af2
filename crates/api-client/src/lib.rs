use crate::error::ApiError;
use async_trait::async_trait;
use configuration::{Provider, API_KEY_ENV};
use core_types::PricePoint;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod error;
pub mod responses;
// --- Public API ---
pub use responses::{ExchangeRateResponse, MonthlyAdjustedResponse};

/// The abstract source of historical prices.
///
/// The backtest engine depends only on this contract, allowing the
/// underlying implementation (live or in-memory) to be swapped out.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches the raw monthly adjusted-close observations for `symbol`.
    ///
    /// Implementations return `ApiError::DataUnavailable` when the provider
    /// has no series for the symbol.
    async fn fetch_monthly_series(&self, symbol: &str) -> Result<Vec<PricePoint>, ApiError>;
}

/// Looks up conversion rates for presenting amounts in another currency.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Units of `quote` per one unit of `base`.
    async fn rate(&self, base: &str, quote: &str) -> Result<Decimal, ApiError>;
}

/// A concrete client for the Alpha Vantage API served through RapidAPI.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(settings: &Provider) -> Result<Self, ApiError> {
        let key = settings
            .api_key
            .as_deref()
            .ok_or(ApiError::MissingApiKey(API_KEY_ENV))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-RapidAPI-Key",
            HeaderValue::from_str(key).map_err(|e| ApiError::InvalidData(e.to_string()))?,
        );
        headers.insert(
            "X-RapidAPI-Host",
            HeaderValue::from_str(&settings.host)
                .map_err(|e| ApiError::InvalidData(e.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn _query<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, ApiError> {
        let url = format!("{}/query", self.base_url);

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            Err(ApiError::ApiError(format!("HTTP {}: {}", status, text)))
        }
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageClient {
    #[tracing::instrument(name = "fetch_monthly_series", skip(self))]
    async fn fetch_monthly_series(&self, symbol: &str) -> Result<Vec<PricePoint>, ApiError> {
        let response: MonthlyAdjustedResponse = self
            ._query(&[("function", "TIME_SERIES_MONTHLY_ADJUSTED"), ("symbol", symbol)])
            .await?;

        let points = response.into_points(symbol)?;
        tracing::debug!(symbol, observations = points.len(), "Received monthly series.");
        Ok(points)
    }
}

#[async_trait]
impl CurrencyRateProvider for AlphaVantageClient {
    async fn rate(&self, base: &str, quote: &str) -> Result<Decimal, ApiError> {
        if base.eq_ignore_ascii_case(quote) {
            return Ok(Decimal::ONE);
        }

        let response: ExchangeRateResponse = self
            ._query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", base),
                ("to_currency", quote),
            ])
            .await?;

        response.into_rate(base, quote)
    }
}
