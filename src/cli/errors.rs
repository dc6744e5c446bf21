//! CLI-specific error types

use std::fmt;

use crate::capability::CapabilityError;
use crate::config::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or environment error
    ConfigError,
    /// No secret key from any source
    MissingSecret,
    /// Token could not be computed
    CapabilityError,
    /// `verify` found the token invalid
    TokenInvalid,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "QUERYDECK_CLI_CONFIG_ERROR",
            Self::MissingSecret => "QUERYDECK_CLI_MISSING_SECRET",
            Self::CapabilityError => "QUERYDECK_CLI_CAPABILITY_ERROR",
            Self::TokenInvalid => "QUERYDECK_CLI_TOKEN_INVALID",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn missing_secret() -> Self {
        Self::new(
            CliErrorCode::MissingSecret,
            "no secret key: pass --secret-key, set QUERYDECK_SECRET_KEY or add secret_key to the config file",
        )
    }

    pub fn token_invalid() -> Self {
        Self::new(CliErrorCode::TokenInvalid, "token does not match statement")
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<CapabilityError> for CliError {
    fn from(e: CapabilityError) -> Self {
        Self::new(CliErrorCode::CapabilityError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
