use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Analysis, Backtest, Benchmark, Config, Display, Logging, Overrides, Provider};

/// Environment variable consulted when `provider.api_key` is not configured.
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

/// Loads the application configuration.
///
/// Reads `path` (or `config.toml` in the working directory) if it exists, then
/// layers `ETFBT__SECTION__KEY` environment variables on top, deserializes the
/// result into our strongly-typed `Config` struct and validates it.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        // An explicitly requested file must exist.
        Some(path) => File::from(path).required(true),
        None => File::with_name("config.toml").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("ETFBT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config = builder.try_deserialize::<Config>()?;
    if config.provider.api_key.is_none() {
        config.provider.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
    }

    validate(&config)?;
    tracing::debug!(
        analysis = ?config.analysis,
        benchmark = ?config.benchmark,
        "Configuration loaded."
    );
    Ok(config)
}

/// Parses configuration from TOML text, without file or environment sources.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.backtest.initial_amount <= rust_decimal::Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "backtest.initial_amount must be greater than 0".to_string(),
        ));
    }
    if config.backtest.monthly_contribution.is_sign_negative() {
        return Err(ConfigError::ValidationError(
            "backtest.monthly_contribution must not be negative".to_string(),
        ));
    }
    if config.benchmark.enabled && config.benchmark.symbol.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "benchmark.symbol must not be empty when the benchmark is enabled".to_string(),
        ));
    }
    if config.provider.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "provider.timeout_secs must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::MissingPricePolicy;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_document_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.risk_free_rate_pct, dec!(2));
        assert_eq!(config.analysis.missing_price_policy, MissingPricePolicy::ZeroGrowth);
        assert_eq!(config.benchmark.symbol, "SPY");
    }

    #[test]
    fn sections_override_defaults() {
        let config = load_config_from_str(
            r#"
            [analysis]
            risk_free_rate_pct = 3.5
            missing_price_policy = "carry_forward"

            [benchmark]
            symbol = "QQQ"
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.risk_free_rate_pct, dec!(3.5));
        assert_eq!(config.analysis.missing_price_policy, MissingPricePolicy::CarryForward);
        assert_eq!(config.benchmark.symbol, "QQQ");
        assert!(config.benchmark.enabled);
        assert_eq!(config.backtest.initial_amount, dec!(10000));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load_config_from_str("[provider]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn negative_contribution_is_rejected() {
        let err = load_config_from_str("[backtest]\nmonthly_contribution = -5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = Config::default();
        config.apply(&Overrides {
            risk_free_rate_pct: Some(dec!(0)),
            carry_forward: true,
            benchmark: Some(" vti ".to_string()),
            no_benchmark: true,
        });

        assert_eq!(config.analysis.risk_free_rate_pct, dec!(0));
        assert_eq!(config.analysis.missing_price_policy, MissingPricePolicy::CarryForward);
        assert_eq!(config.benchmark.symbol, "VTI");
        assert!(!config.benchmark.enabled);
    }
}
