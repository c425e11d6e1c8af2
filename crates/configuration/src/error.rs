use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read, or a file or `ETFBT__*` value has the wrong shape.
    #[error("Failed to load configuration from file or environment: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),
}
