use crate::error::PortfolioError;
use crate::pipeline::Pipeline;
use analytics::BenchmarkResult;
use core_types::{
    AnnualReturnRecord, BacktestWarning, Holding, Instrument, MonthlySnapshot, PortfolioConfig,
    PriceSeries,
};
use rust_decimal::Decimal;

/// The reference instrument's run over the primary portfolio's window.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRun {
    pub symbol: String,
    pub result: BenchmarkResult,
    pub annual_returns: Vec<AnnualReturnRecord>,
    pub snapshots: Vec<MonthlySnapshot>,
    pub warnings: Vec<BacktestWarning>,
}

/// Re-runs the pipeline for a single instrument held at 100%.
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    pipeline: Pipeline,
    symbol: String,
}

impl BenchmarkRunner {
    pub fn new(pipeline: Pipeline, symbol: impl Into<String>) -> Self {
        Self {
            pipeline,
            symbol: symbol.into(),
        }
    }

    /// Runs the benchmark with the window, initial amount and contribution of `config`.
    pub fn run(
        &self,
        config: &PortfolioConfig,
        prices: &PriceSeries,
    ) -> Result<BenchmarkRun, PortfolioError> {
        let holding = Holding::new(self.symbol.clone(), Decimal::ONE_HUNDRED);
        let config = config.with_holdings(vec![holding.clone()]);
        let instrument = Instrument {
            holding,
            prices: prices.clone(),
        };

        let run = self.pipeline.run(&config, &[instrument])?;
        tracing::debug!(
            symbol = %self.symbol,
            final_amount = %run.result.final_amount,
            "Benchmark run complete."
        );

        Ok(BenchmarkRun {
            symbol: self.symbol.clone(),
            result: run.result,
            annual_returns: run.annual_returns,
            snapshots: run.snapshots,
            warnings: run.warnings,
        })
    }
}
