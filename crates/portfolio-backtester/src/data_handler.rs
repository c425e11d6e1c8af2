use api_client::PriceProvider;
use api_client::error::ApiError;
use core_types::{BacktestWarning, PriceSeries};
use futures::future::join_all;
use indicatif::ProgressBar;
use std::collections::HashMap;

/// Normalized price tables for every symbol that could be loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceData {
    pub series: HashMap<String, PriceSeries>,
    /// One `DataUnavailable` warning per symbol that could not be loaded.
    pub warnings: Vec<BacktestWarning>,
}

impl PriceData {
    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    /// The reason a symbol failed to load, if it did.
    pub fn failure(&self, symbol: &str) -> Option<&BacktestWarning> {
        self.warnings.iter().find(|w| w.symbol() == symbol)
    }
}

/// Concurrently fetches and normalizes the monthly series of every symbol.
///
/// All requests run to completion; a failed symbol becomes a warning instead
/// of aborting the others. `progress` advances once per finished symbol.
pub async fn load_price_data(
    provider: &dyn PriceProvider,
    symbols: &[String],
    progress: &ProgressBar,
) -> PriceData {
    progress.set_length(symbols.len() as u64);

    let fetch_futures = symbols.iter().map(|symbol| async move {
        let result = fetch_series(provider, symbol).await;
        progress.inc(1);
        (symbol.clone(), result)
    });

    let mut data = PriceData::default();
    for (symbol, result) in join_all(fetch_futures).await {
        match result {
            Ok(series) => {
                data.series.insert(symbol, series);
            }
            Err(reason) => {
                tracing::warn!(symbol = %symbol, reason = %reason, "No usable price data.");
                data.warnings.push(BacktestWarning::DataUnavailable { symbol, reason });
            }
        }
    }

    tracing::info!(
        loaded = data.series.len(),
        failed = data.warnings.len(),
        "Price data loaded."
    );
    data
}

async fn fetch_series(provider: &dyn PriceProvider, symbol: &str) -> Result<PriceSeries, String> {
    let points = provider.fetch_monthly_series(symbol).await.map_err(|e| match e {
        ApiError::DataUnavailable { reason, .. } => reason,
        other => other.to_string(),
    })?;
    PriceSeries::from_observations(symbol, points).map_err(|e| e.to_string())
}
