//! Executor error types
//!
//! Errors raised by the database collaborator are carried through the
//! capture and replay layers unchanged.

use thiserror::Error;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Database collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// No connection could be obtained
    #[error("Connection unavailable: {0}")]
    Connection(String),

    /// The database refused or failed a statement
    #[error("Statement failed: {message}")]
    Statement { sql: String, message: String },
}

impl ExecutorError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn statement(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Statement {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "EXECUTOR_CONNECTION",
            Self::Statement { .. } => "EXECUTOR_STATEMENT",
        }
    }
}
