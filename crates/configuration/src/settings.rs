use core_types::MissingPricePolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty or missing `config.toml` is valid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backtest: Backtest,
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub benchmark: Benchmark,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub logging: Logging,
}

/// Default amounts for a backtest run when the command line omits them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Backtest {
    /// The lump sum invested at the start of the window.
    pub initial_amount: Decimal,
    /// The amount added at the start of every month.
    pub monthly_contribution: Decimal,
}

/// Parameters for the return and risk calculations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Analysis {
    /// Annual risk-free rate in percent, used by the Sharpe and Sortino ratios.
    pub risk_free_rate_pct: Decimal,
    /// What the simulator does with a month that has no usable close.
    pub missing_price_policy: MissingPricePolicy,
}

/// The reference instrument the portfolio is compared against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Benchmark {
    pub symbol: String,
    pub enabled: bool,
}

/// Connection settings for the market-data provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Provider {
    pub base_url: String,
    /// Value of the `X-RapidAPI-Host` header.
    pub host: String,
    /// Falls back to the `RAPIDAPI_KEY` environment variable when unset.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Display {
    /// Currency amounts are shown in. Price data is quoted in USD.
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Directory for daily rolling log files. Console only when unset.
    pub directory: Option<String>,
    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    pub filter: String,
}

// --- Default Implementations ---

impl Default for Backtest {
    fn default() -> Self {
        Self {
            initial_amount: dec!(10000),
            monthly_contribution: Decimal::ZERO,
        }
    }
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            risk_free_rate_pct: dec!(2),
            missing_price_policy: MissingPricePolicy::default(),
        }
    }
}

impl Default for Benchmark {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            enabled: true,
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            base_url: "https://alpha-vantage.p.rapidapi.com".to_string(),
            host: "alpha-vantage.p.rapidapi.com".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            directory: None,
            filter: "info".to_string(),
        }
    }
}

/// Command-line overrides for the analysis and benchmark sections.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Overrides {
    /// Annual risk-free rate in percent (default from config, 2 if unset).
    #[cfg_attr(feature = "clap", arg(long = "risk-free"))]
    pub risk_free_rate_pct: Option<Decimal>,

    /// Carry the last known price forward over missing months instead of assuming zero growth.
    #[cfg_attr(feature = "clap", arg(long))]
    pub carry_forward: bool,

    /// Benchmark symbol to compare against.
    #[cfg_attr(feature = "clap", arg(long))]
    pub benchmark: Option<String>,

    /// Skip the benchmark comparison.
    #[cfg_attr(feature = "clap", arg(long))]
    pub no_benchmark: bool,
}

impl Config {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(rate) = overrides.risk_free_rate_pct {
            self.analysis.risk_free_rate_pct = rate;
        }
        if overrides.carry_forward {
            self.analysis.missing_price_policy = MissingPricePolicy::CarryForward;
        }
        if let Some(symbol) = &overrides.benchmark {
            self.benchmark.symbol = symbol.trim().to_uppercase();
        }
        if overrides.no_benchmark {
            self.benchmark.enabled = false;
        }
    }
}
