use crate::error::PortfolioError;
use analytics::{AnalyticsEngine, InstrumentSummary, PortfolioResult, ReturnAnalyzer};
use backtester::GrowthSimulator;
use core_types::{
    AnnualReturnRecord, BacktestWarning, Instrument, MissingPricePolicy, MonthlySnapshot,
    PortfolioConfig,
};
use rust_decimal::Decimal;

/// Everything one pass of simulation and analysis produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub result: PortfolioResult,
    pub instruments: Vec<InstrumentSummary>,
    pub annual_returns: Vec<AnnualReturnRecord>,
    pub portfolio_annual_returns: Vec<AnnualReturnRecord>,
    pub snapshots: Vec<MonthlySnapshot>,
    pub warnings: Vec<BacktestWarning>,
}

/// Simulation followed by return and risk analysis over already-loaded prices.
///
/// Holds no state between runs: the same inputs always give the same output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pipeline {
    simulator: GrowthSimulator,
    analyzer: ReturnAnalyzer,
    engine: AnalyticsEngine,
}

impl Pipeline {
    pub fn new(risk_free_rate_pct: Decimal, policy: MissingPricePolicy) -> Self {
        Self {
            simulator: GrowthSimulator::new(policy),
            analyzer: ReturnAnalyzer::new(),
            engine: AnalyticsEngine::new(risk_free_rate_pct),
        }
    }

    pub fn run(
        &self,
        config: &PortfolioConfig,
        instruments: &[Instrument],
    ) -> Result<PipelineRun, PortfolioError> {
        let trajectory = self.simulator.simulate(config, instruments)?;

        let annual = self.analyzer.annual_returns(
            instruments,
            config.start_month().year(),
            config.end_month().year(),
        );
        let result = self.engine.calculate(&trajectory.totals, &annual.portfolio)?;

        let summaries = instruments
            .iter()
            .filter_map(|instrument| self.analyzer.instrument_summary(instrument, config))
            .collect();

        let mut warnings = trajectory.warnings;
        warnings.extend(annual.warnings);

        Ok(PipelineRun {
            result,
            instruments: summaries,
            annual_returns: annual.records,
            portfolio_annual_returns: annual.portfolio,
            snapshots: trajectory.snapshots,
            warnings,
        })
    }
}
