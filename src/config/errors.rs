//! Configuration errors

use std::io;

use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid JSON for [`DeckConfig`](super::DeckConfig)
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is present but unusable
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => "QUERYDECK_CONFIG_IO",
            ConfigError::Parse(_) => "QUERYDECK_CONFIG_PARSE",
            ConfigError::Invalid(_) => "QUERYDECK_CONFIG_INVALID",
        }
    }
}
