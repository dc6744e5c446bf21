//! Database collaborator
//!
//! querydeck never talks to a driver directly. Hosts implement
//! [`SqlExecutor`] over their pool; each replay acquires one
//! [`SqlConnection`] and holds it exclusively until the operation is done,
//! so multi-statement sequences (profiling) cannot interleave with other
//! work on the same connection.

mod errors;
mod scripted;

pub use errors::{ExecutorError, ExecutorResult};
pub use scripted::ScriptedExecutor;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Tabular result of one statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Result of a statement that returns no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One exclusively held database connection
#[async_trait]
pub trait SqlConnection: Send {
    /// Run `sql` verbatim
    async fn execute(&mut self, sql: &str) -> ExecutorResult<ResultSet>;
}

/// Source of connections, typically a pool
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn acquire(&self) -> ExecutorResult<Box<dyn SqlConnection>>;
}
