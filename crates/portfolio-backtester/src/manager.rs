use crate::benchmark::{BenchmarkRun, BenchmarkRunner};
use crate::data_handler::{PriceData, load_price_data};
use crate::error::PortfolioError;
use crate::pipeline::Pipeline;
use crate::validator::validate;
use analytics::{InstrumentSummary, PortfolioResult};
use api_client::PriceProvider;
use configuration::Config;
use core_types::{
    AnnualReturnRecord, BacktestWarning, Instrument, MissingPricePolicy, MonthlySnapshot,
    PortfolioConfig,
};
use indicatif::ProgressBar;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Instrument as _;
use uuid::Uuid;

/// Caller-held parameters of a run that are not part of the portfolio itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub risk_free_rate_pct: Decimal,
    pub missing_price_policy: MissingPricePolicy,
    /// The reference symbol, or `None` to skip the comparison.
    pub benchmark: Option<String>,
}

impl From<&Config> for BacktestSettings {
    fn from(config: &Config) -> Self {
        Self {
            risk_free_rate_pct: config.analysis.risk_free_rate_pct,
            missing_price_policy: config.analysis.missing_price_policy,
            benchmark: config
                .benchmark
                .enabled
                .then(|| config.benchmark.symbol.clone()),
        }
    }
}

/// The complete output of one backtest. Amounts are in the price data's currency.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    pub result: PortfolioResult,
    pub instruments: Vec<InstrumentSummary>,
    pub annual_returns: Vec<AnnualReturnRecord>,
    pub portfolio_annual_returns: Vec<AnnualReturnRecord>,
    pub snapshots: Vec<MonthlySnapshot>,
    pub benchmark: Option<BenchmarkRun>,
    pub warnings: Vec<BacktestWarning>,
}

/// Runs the synchronous part of a backtest over already-loaded prices.
///
/// Holdings without data are left out, which is reported through the
/// `DataUnavailable` warnings already present in `data`. A failed benchmark
/// never fails the run.
pub fn run_backtest(
    config: &PortfolioConfig,
    data: &PriceData,
    settings: &BacktestSettings,
) -> Result<BacktestOutcome, PortfolioError> {
    validate(config)?;

    let instruments: Vec<Instrument> = config
        .holdings
        .iter()
        .filter_map(|holding| {
            data.get(&holding.symbol).map(|prices| Instrument {
                holding: holding.clone(),
                prices: prices.clone(),
            })
        })
        .collect();
    if instruments.is_empty() {
        return Err(PortfolioError::DataUnavailable(config.symbols().join(", ")));
    }

    let pipeline = Pipeline::new(settings.risk_free_rate_pct, settings.missing_price_policy);
    let run = pipeline.run(config, &instruments)?;

    let mut warnings = data.warnings.clone();
    warnings.extend(run.warnings);

    let benchmark = match settings.benchmark.as_deref() {
        None => None,
        Some(symbol) => match data.get(symbol) {
            Some(prices) => match BenchmarkRunner::new(pipeline, symbol).run(config, prices) {
                Ok(benchmark) => Some(benchmark),
                Err(e) => {
                    tracing::warn!(
                        symbol,
                        error = %e,
                        "Benchmark run failed; continuing without it."
                    );
                    warnings.push(BacktestWarning::DataUnavailable {
                        symbol: symbol.to_string(),
                        reason: e.to_string(),
                    });
                    None
                }
            },
            None => {
                if data.failure(symbol).is_none() {
                    warnings.push(BacktestWarning::DataUnavailable {
                        symbol: symbol.to_string(),
                        reason: "benchmark prices were not loaded".to_string(),
                    });
                }
                None
            }
        },
    };

    Ok(BacktestOutcome {
        result: run.result,
        instruments: run.instruments,
        annual_returns: run.annual_returns,
        portfolio_annual_returns: run.portfolio_annual_returns,
        snapshots: run.snapshots,
        benchmark,
        warnings,
    })
}

/// Fetches prices and runs backtests, discarding runs overtaken by a newer one.
///
/// Every call to [`PortfolioManager::run`] takes a new generation number. A
/// run whose fetch completes after a later run has started returns
/// `PortfolioError::Superseded` instead of a result.
pub struct PortfolioManager {
    provider: Arc<dyn PriceProvider>,
    settings: BacktestSettings,
    generation: AtomicU64,
}

impl PortfolioManager {
    pub fn new(provider: Arc<dyn PriceProvider>, settings: BacktestSettings) -> Self {
        Self {
            provider,
            settings,
            generation: AtomicU64::new(0),
        }
    }

    /// Portfolio symbols followed by the benchmark symbol, each once.
    pub fn symbols_for(&self, config: &PortfolioConfig) -> Vec<String> {
        let mut symbols = config.symbols();
        if let Some(benchmark) = &self.settings.benchmark {
            if !symbols.contains(benchmark) {
                symbols.push(benchmark.clone());
            }
        }
        symbols
    }

    pub async fn run(
        &self,
        config: &PortfolioConfig,
        progress: &ProgressBar,
    ) -> Result<BacktestOutcome, PortfolioError> {
        validate(config)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let span = tracing::info_span!("backtest", run_id = %Uuid::new_v4(), generation);

        async move {
            let symbols = self.symbols_for(config);
            tracing::info!(
                symbols = ?symbols,
                start = %config.start_date,
                end = %config.end_date,
                "Starting backtest."
            );

            let data = load_price_data(self.provider.as_ref(), &symbols, progress).await;

            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::warn!("A newer backtest started while fetching; discarding results.");
                return Err(PortfolioError::Superseded);
            }

            let outcome = run_backtest(config, &data, &self.settings)?;
            tracing::info!(
                final_amount = %outcome.result.final_amount,
                total_return_pct = %outcome.result.total_return_pct,
                warnings = outcome.warnings.len(),
                "Backtest complete."
            );
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
