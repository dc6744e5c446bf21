//! # Capability Errors

use thiserror::Error;

/// Result type for capability operations
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Capability token errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Presented token does not match the statement and key
    #[error("Capability token does not match statement")]
    TokenMismatch,

    /// The secret key could not be used by the chosen algorithm
    #[error("Secret key rejected by {0}")]
    InvalidKey(&'static str),

    /// Unknown token algorithm name
    #[error("Unknown token algorithm: {0}")]
    UnknownAlgorithm(String),
}
