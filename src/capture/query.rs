//! Captured Query
//!
//! Immutable record of one executed statement: its text, how long it took
//! and where it was issued from. The three replay operations live here so
//! the dispatcher only has to pick one.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use super::backtrace::BacktraceFilter;
use crate::capability::{CapabilityResult, CapabilityToken, CapabilityValidator};
use crate::executor::{ExecutorResult, ResultSet, SqlConnection};

/// Read-only statements are the only ones offered explain/profile
static INSPECTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^SELECT").expect("valid inspectable pattern"));

pub const PROFILING_ON: &str = "SET PROFILING=1";
pub const PROFILING_OFF: &str = "SET PROFILING=0";
pub const LAST_PROFILE: &str = "SELECT * FROM information_schema.profiling \
     WHERE query_id = (SELECT query_id FROM information_schema.profiling \
     ORDER BY query_id DESC LIMIT 1)";

/// One executed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedQuery {
    sql: String,
    elapsed_seconds: f64,
    backtrace: Vec<String>,
    captured_at: DateTime<Utc>,
}

impl CapturedQuery {
    /// Negative or non-finite durations are stored as zero
    pub fn new(sql: impl Into<String>, elapsed_seconds: f64, backtrace: Vec<String>) -> Self {
        let elapsed_seconds = if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            elapsed_seconds
        } else {
            0.0
        };
        Self {
            sql: sql.into(),
            elapsed_seconds,
            backtrace,
            captured_at: Utc::now(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed_seconds * 1000.0
    }

    pub fn backtrace(&self) -> &[String] {
        &self.backtrace
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// e.g. `12.34ms`
    pub fn human_time(&self) -> String {
        format!("{:.2}ms", self.elapsed_millis())
    }

    pub fn is_inspectable(&self) -> bool {
        INSPECTABLE.is_match(self.sql.trim())
    }

    pub fn filtered_backtrace<'a>(&'a self, filter: &BacktraceFilter) -> Vec<&'a str> {
        filter.filter(&self.backtrace)
    }

    pub fn has_backtrace(&self, filter: &BacktraceFilter) -> bool {
        self.backtrace.iter().any(|frame| filter.keeps(frame))
    }

    pub fn capability_token(
        &self,
        validator: &CapabilityValidator,
    ) -> CapabilityResult<CapabilityToken> {
        validator.token_for(&self.sql)
    }

    pub fn validate_token(
        &self,
        validator: &CapabilityValidator,
        presented: &str,
    ) -> CapabilityResult<bool> {
        validator.is_valid(&self.sql, presented)
    }

    pub async fn explain(&self, conn: &mut dyn SqlConnection) -> ExecutorResult<ResultSet> {
        conn.execute(&format!("EXPLAIN {}", self.sql)).await
    }

    /// Profile the statement on `conn` and return its profiling rows.
    ///
    /// All four statements go to the same connection; the caller must hold
    /// it exclusively for the duration.
    pub async fn profile(&self, conn: &mut dyn SqlConnection) -> ExecutorResult<ResultSet> {
        conn.execute(PROFILING_ON).await?;
        if let Err(err) = conn.execute(&self.sql).await {
            // Leave the connection as we found it; the statement's error wins.
            let _ = conn.execute(PROFILING_OFF).await;
            return Err(err);
        }
        conn.execute(PROFILING_OFF).await?;
        conn.execute(LAST_PROFILE).await
    }

    pub async fn execute(&self, conn: &mut dyn SqlConnection) -> ExecutorResult<ResultSet> {
        conn.execute(&self.sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SecretKey;
    use crate::executor::{ScriptedExecutor, SqlExecutor};

    #[test]
    fn test_human_time() {
        assert_eq!(CapturedQuery::new("SELECT 1", 0.01234, vec![]).human_time(), "12.34ms");
        assert_eq!(CapturedQuery::new("SELECT 1", 0.015, vec![]).human_time(), "15.00ms");
        assert_eq!(CapturedQuery::new("SELECT 1", 0.0, vec![]).human_time(), "0.00ms");
    }

    #[test]
    fn test_elapsed_clamped() {
        assert_eq!(CapturedQuery::new("SELECT 1", -1.0, vec![]).elapsed_seconds(), 0.0);
        assert_eq!(CapturedQuery::new("SELECT 1", f64::NAN, vec![]).elapsed_seconds(), 0.0);
        assert_eq!(
            CapturedQuery::new("SELECT 1", f64::INFINITY, vec![]).elapsed_seconds(),
            0.0
        );
    }

    #[test]
    fn test_is_inspectable() {
        let inspectable = |sql: &str| CapturedQuery::new(sql, 0.0, vec![]).is_inspectable();
        assert!(inspectable("SELECT * FROM users"));
        assert!(inspectable("  select id from t"));
        assert!(inspectable("\n\tSeLeCt 1"));
        assert!(!inspectable("UPDATE users SET x=1"));
        assert!(!inspectable(""));
        assert!(!inspectable("WITH x AS (SELECT 1) SELECT * FROM x"));
    }

    #[test]
    fn test_has_backtrace_uses_filter() {
        let filter = BacktraceFilter::new("/srv/app");
        let vendored = CapturedQuery::new(
            "SELECT 1",
            0.0,
            vec!["/srv/app/vendor/orm.rs:1:1".to_string()],
        );
        let own = CapturedQuery::new(
            "SELECT 1",
            0.0,
            vec![
                "/srv/app/vendor/orm.rs:1:1".to_string(),
                "/srv/app/src/main.rs:9:1".to_string(),
            ],
        );
        assert!(!vendored.has_backtrace(&filter));
        assert!(own.has_backtrace(&filter));
        assert_eq!(own.filtered_backtrace(&filter), vec!["/srv/app/src/main.rs:9:1"]);
    }

    #[test]
    fn test_token_round_trip() {
        let validator = CapabilityValidator::sha1(SecretKey::new("secret").unwrap());
        let query = CapturedQuery::new("SELECT 1", 0.0, vec![]);
        let token = query.capability_token(&validator).unwrap();
        assert!(query.validate_token(&validator, token.as_str()).unwrap());
        assert!(!query.validate_token(&validator, "deadbeef").unwrap());
    }

    #[tokio::test]
    async fn test_explain_prefixes_statement() {
        let executor = ScriptedExecutor::new();
        let mut conn = executor.acquire().await.unwrap();
        CapturedQuery::new("SELECT 1", 0.0, vec![])
            .explain(conn.as_mut())
            .await
            .unwrap();
        assert_eq!(executor.statements(), vec!["EXPLAIN SELECT 1"]);
    }

    #[tokio::test]
    async fn test_profile_sequence() {
        let executor = ScriptedExecutor::new();
        let mut conn = executor.acquire().await.unwrap();
        CapturedQuery::new("SELECT 1", 0.0, vec![])
            .profile(conn.as_mut())
            .await
            .unwrap();
        assert_eq!(
            executor.statements(),
            vec![PROFILING_ON, "SELECT 1", PROFILING_OFF, LAST_PROFILE]
        );
    }

    #[tokio::test]
    async fn test_profile_failure_disables_profiling() {
        let executor = ScriptedExecutor::new().fail_on("SELECT BROKEN", "syntax error");
        let mut conn = executor.acquire().await.unwrap();
        let result = CapturedQuery::new("SELECT broken", 0.0, vec![])
            .profile(conn.as_mut())
            .await;
        assert!(result.is_err());
        assert_eq!(
            executor.statements(),
            vec![PROFILING_ON, "SELECT broken", PROFILING_OFF]
        );
    }

    #[tokio::test]
    async fn test_execute_verbatim() {
        let executor = ScriptedExecutor::new();
        let mut conn = executor.acquire().await.unwrap();
        CapturedQuery::new("UPDATE t SET x = 1", 0.0, vec![])
            .execute(conn.as_mut())
            .await
            .unwrap();
        assert_eq!(executor.statements(), vec!["UPDATE t SET x = 1"]);
    }
}
