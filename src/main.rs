use analytics::{ExportReport, InstrumentSummary, PortfolioResult};
use anyhow::Context;
use api_client::{AlphaVantageClient, CurrencyRateProvider};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::{Config, Logging, Overrides, load_config};
use core_types::{Holding, PortfolioConfig};
use indicatif::{ProgressBar, ProgressStyle};
use portfolio_backtester::{BacktestOutcome, BacktestSettings, PortfolioManager};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod render;

/// Currency the provider quotes prices in.
const NATIVE_CURRENCY: &str = "USD";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the key may come from the environment or config.toml.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.logging)?;

    match cli.command {
        Commands::Backtest(args) => handle_backtest(args, config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Backtests a fixed-allocation ETF portfolio against historical monthly prices.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a portfolio over a date window and report its performance.
    Backtest(BacktestArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// A holding as SYMBOL=PERCENT (e.g., "SPY=60"). Repeat for each instrument.
    #[arg(long = "asset", required = true)]
    assets: Vec<Holding>,

    /// The first day of the window (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// The last day of the window (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// The lump sum invested at the start.
    #[arg(long)]
    initial: Option<Decimal>,

    /// The amount added at the start of every month.
    #[arg(long)]
    monthly: Option<Decimal>,

    /// Currency to show amounts in (e.g., "KRW").
    #[arg(long)]
    currency: Option<String>,

    /// Print the export record as JSON instead of tables.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    overrides: Overrides,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: stderr always, plus a daily rolling file
/// when a log directory is configured. `RUST_LOG` wins over the config filter.
fn init_logging(settings: &Logging) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&settings.filter))?;

    let (file_layer, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "etf-backtester.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

// ==============================================================================
// Backtest Command Logic
// ==============================================================================

async fn handle_backtest(args: BacktestArgs, mut config: Config) -> anyhow::Result<()> {
    config.apply(&args.overrides);

    let portfolio = PortfolioConfig {
        holdings: args.assets,
        start_date: args.from,
        end_date: args.to,
        initial_amount: args.initial.unwrap_or(config.backtest.initial_amount),
        monthly_contribution: args.monthly.unwrap_or(config.backtest.monthly_contribution),
    };
    portfolio_backtester::validate(&portfolio)?;

    let client = Arc::new(AlphaVantageClient::new(&config.provider)?);
    let manager = PortfolioManager::new(client.clone(), BacktestSettings::from(&config));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template(
        "{spinner:.green} {msg} [{pos}/{len}]",
    )?);
    spinner.set_message("Fetching monthly prices...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = manager.run(&portfolio, &spinner).await;
    spinner.finish_and_clear();
    let outcome = outcome.context("Backtest failed")?;

    let requested = args
        .currency
        .unwrap_or_else(|| config.display.currency.clone())
        .to_uppercase();
    let (rate, mut currency) = conversion_rate(client.as_ref(), &requested).await;

    let (result, benchmark_result, instruments) = match converted(&outcome, rate) {
        Some(amounts) => amounts,
        None => {
            tracing::warn!(
                currency = %currency,
                "Converted amounts are out of range; showing amounts in {}.",
                NATIVE_CURRENCY
            );
            currency = NATIVE_CURRENCY.to_string();
            (
                outcome.result.clone(),
                outcome.benchmark.as_ref().map(|b| b.result.clone()),
                outcome.instruments.clone(),
            )
        }
    };
    let benchmark = outcome
        .benchmark
        .as_ref()
        .map(|b| b.symbol.as_str())
        .zip(benchmark_result.as_ref());

    if args.json {
        let report = ExportReport::new(
            &result,
            &instruments,
            &outcome.annual_returns,
            &outcome.portfolio_annual_returns,
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", render::summary_table(&result, benchmark, &currency));
    println!("{}", render::instrument_table(&instruments, &currency));
    if !outcome.annual_returns.is_empty() {
        let symbols: Vec<String> = instruments.iter().map(|i| i.symbol.clone()).collect();
        let table = render::annual_table(
            &symbols,
            &outcome.annual_returns,
            &outcome.portfolio_annual_returns,
        );
        println!("{table}");
    }
    for line in render::warning_lines(&outcome.warnings) {
        println!("warning: {line}");
    }
    if let Some(run) = &outcome.benchmark {
        for line in render::benchmark_warning_lines(&run.symbol, &run.warnings) {
            println!("warning: {line}");
        }
    }

    Ok(())
}

/// Every amount of `outcome` multiplied by `rate`: the portfolio result, the
/// benchmark result and the instrument summaries. `None` if any would overflow.
fn converted(
    outcome: &BacktestOutcome,
    rate: Decimal,
) -> Option<(PortfolioResult, Option<PortfolioResult>, Vec<InstrumentSummary>)> {
    let result = outcome.result.converted(rate)?;
    let benchmark = match &outcome.benchmark {
        Some(run) => Some(run.result.converted(rate)?),
        None => None,
    };
    let instruments = outcome
        .instruments
        .iter()
        .map(|i| i.converted(rate))
        .collect::<Option<Vec<_>>>()?;
    Some((result, benchmark, instruments))
}

/// The multiplier from native amounts to `quote`, and the currency amounts end
/// up in. Falls back to native amounts when no rate can be fetched.
async fn conversion_rate(provider: &dyn CurrencyRateProvider, quote: &str) -> (Decimal, String) {
    match provider.rate(NATIVE_CURRENCY, quote).await {
        Ok(rate) if rate > Decimal::ZERO => (rate, quote.to_string()),
        Ok(rate) => {
            tracing::warn!(currency = quote, %rate, "Ignoring non-positive exchange rate.");
            (Decimal::ONE, NATIVE_CURRENCY.to_string())
        }
        Err(e) => {
            tracing::warn!(
                currency = quote,
                error = %e,
                "Exchange rate unavailable; showing amounts in {}.",
                NATIVE_CURRENCY
            );
            (Decimal::ONE, NATIVE_CURRENCY.to_string())
        }
    }
}
