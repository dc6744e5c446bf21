//! In-memory executor for tests and demos
//!
//! Records every statement it receives, in order, and answers from a
//! script of prefix rules. Unmatched statements return an empty result.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ExecutorError, ExecutorResult, ResultSet, SqlConnection, SqlExecutor};

#[derive(Debug, Clone)]
enum Reply {
    Rows(ResultSet),
    Fail(String),
}

#[derive(Debug, Default)]
struct Script {
    rules: Vec<(String, Reply)>,
    statements: Vec<String>,
    acquisitions: usize,
    unavailable: Option<String>,
}

impl Script {
    fn reply_for(&self, sql: &str) -> Option<&Reply> {
        let upper = sql.trim_start().to_ascii_uppercase();
        self.rules
            .iter()
            .find(|(prefix, _)| upper.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply)
    }
}

/// Scripted, recording [`SqlExecutor`]
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: Arc<Mutex<Script>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements starting with `prefix` (case-insensitive) with `rows`
    pub fn respond_to(self, prefix: &str, rows: ResultSet) -> Self {
        self.lock()
            .rules
            .push((prefix.to_ascii_uppercase(), Reply::Rows(rows)));
        self
    }

    /// Fail statements starting with `prefix` (case-insensitive)
    pub fn fail_on(self, prefix: &str, message: &str) -> Self {
        self.lock()
            .rules
            .push((prefix.to_ascii_uppercase(), Reply::Fail(message.to_string())));
        self
    }

    /// Refuse every connection request
    pub fn unavailable(self, message: &str) -> Self {
        self.lock().unavailable = Some(message.to_string());
        self
    }

    /// Every statement received so far, in order
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Number of connections handed out
    pub fn acquisitions(&self) -> usize {
        self.lock().acquisitions
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SqlExecutor for ScriptedExecutor {
    async fn acquire(&self) -> ExecutorResult<Box<dyn SqlConnection>> {
        let mut script = self.lock();
        if let Some(message) = &script.unavailable {
            return Err(ExecutorError::connection(message.clone()));
        }
        script.acquisitions += 1;
        Ok(Box::new(ScriptedConnection {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl SqlConnection for ScriptedConnection {
    async fn execute(&mut self, sql: &str) -> ExecutorResult<ResultSet> {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        script.statements.push(sql.to_string());
        match script.reply_for(sql) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Fail(message)) => Err(ExecutorError::statement(sql, message.clone())),
            None => Ok(ResultSet::empty()),
        }
    }
}
