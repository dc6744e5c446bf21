//! Replay Dispatcher
//!
//! Rebuilds a captured statement from request parameters, checks its
//! capability token and runs exactly one diagnostic operation.
//!
//! ## Sequence
//! 1. No secret key: not found
//! 2. Path names no operation: not found
//! 3. Token mismatch: security rejection
//! 4. Blank statement: malformed request
//! 5. Acquire one connection, run the operation, render
//!
//! Steps 1-4 never touch the database.

use std::sync::Arc;

use crate::capability::CapabilityValidator;
use crate::capture::CapturedQuery;
use crate::executor::{ResultSet, SqlExecutor};
use crate::observability::Event;
use crate::render::{RenderedView, ViewRenderer, ViewValues};

use super::errors::{ReplayError, ReplayResult};
use super::operation::{ReplayOperation, ReplayRequest};

/// Routes replay requests to the three operations
pub struct ReplayDispatcher {
    validator: Option<CapabilityValidator>,
    executor: Arc<dyn SqlExecutor>,
    renderer: Arc<dyn ViewRenderer>,
}

impl ReplayDispatcher {
    /// `validator` is `None` when no secret key is provisioned
    pub fn new(
        validator: Option<CapabilityValidator>,
        executor: Arc<dyn SqlExecutor>,
        renderer: Arc<dyn ViewRenderer>,
    ) -> Self {
        Self {
            validator,
            executor,
            renderer,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.validator.is_some()
    }

    /// Handle one replay request end to end
    pub async fn dispatch(&self, request: &ReplayRequest) -> ReplayResult<RenderedView> {
        tracing::debug!(event = %Event::ReplayReceived, path = %request.path, "replay request");

        let result = self.run(request).await;
        match &result {
            Ok(view) => tracing::info!(
                event = %Event::ReplayDispatched,
                view = %view.view,
                "replay complete"
            ),
            Err(err) if err.is_security_rejection() => tracing::warn!(
                event = %Event::ReplayRejected,
                path = %request.path,
                kind = err.kind(),
                "capability token rejected"
            ),
            Err(err) if err.is_not_found() => tracing::debug!(
                event = %Event::ReplayNotFound,
                path = %request.path,
                kind = err.kind(),
                "replay not found"
            ),
            Err(ReplayError::MalformedRequest(reason)) => tracing::info!(
                event = %Event::ReplayMalformed,
                path = %request.path,
                reason = %reason,
                "malformed replay request"
            ),
            Err(err) => tracing::error!(
                event = %Event::ReplayFailed,
                path = %request.path,
                kind = err.kind(),
                error = %err,
                "replay failed"
            ),
        }
        result
    }

    async fn run(&self, request: &ReplayRequest) -> ReplayResult<RenderedView> {
        let validator = self.validator.as_ref().ok_or(ReplayError::NotConfigured)?;

        let operation = ReplayOperation::from_path(&request.path)
            .ok_or_else(|| ReplayError::UnknownRoute(request.path.clone()))?;

        let query = CapturedQuery::new(
            request.params.query.clone(),
            request.elapsed_seconds(),
            Vec::new(),
        );

        // Authorization precedes any database work.
        validator.authorize(query.sql(), &request.params.hash)?;

        if query.sql().trim().is_empty() {
            return Err(ReplayError::MalformedRequest(
                "query parameter is blank".to_string(),
            ));
        }

        let result = self.perform(operation, &query).await?;
        self.render(operation, &query, &result)
    }

    async fn perform(
        &self,
        operation: ReplayOperation,
        query: &CapturedQuery,
    ) -> ReplayResult<ResultSet> {
        // One connection for the whole operation; profiling relies on it.
        let mut conn = self.executor.acquire().await?;
        let result = match operation {
            ReplayOperation::Explain => query.explain(conn.as_mut()).await?,
            ReplayOperation::Profile => query.profile(conn.as_mut()).await?,
            ReplayOperation::Execute => query.execute(conn.as_mut()).await?,
        };
        Ok(result)
    }

    fn render(
        &self,
        operation: ReplayOperation,
        query: &CapturedQuery,
        result: &ResultSet,
    ) -> ReplayResult<RenderedView> {
        let values = ViewValues::new()
            .with("query", &query.sql())?
            .with("time", &query.human_time())?
            .with("elapsed_seconds", &query.elapsed_seconds())?
            .with("result", result)?;
        Ok(self.renderer.render(operation.view_name(), &values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SecretKey;
    use crate::executor::ScriptedExecutor;
    use crate::render::JsonRenderer;
    use crate::replay::ReplayParams;

    fn dispatcher(secret: Option<&str>, executor: &ScriptedExecutor) -> ReplayDispatcher {
        ReplayDispatcher::new(
            SecretKey::from_optional(secret).map(CapabilityValidator::sha1),
            Arc::new(executor.clone()),
            Arc::new(JsonRenderer::new()),
        )
    }

    fn request(path: &str, query: &str, hash: &str) -> ReplayRequest {
        ReplayRequest::new(
            path,
            ReplayParams {
                query: query.to_string(),
                time: "0.01".to_string(),
                hash: hash.to_string(),
            },
        )
    }

    fn token(sql: &str) -> String {
        CapabilityValidator::sha1(SecretKey::new("secret").unwrap())
            .token_for(sql)
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_not_configured() {
        let executor = ScriptedExecutor::new();
        let result = dispatcher(None, &executor)
            .dispatch(&request("explain_sql", "SELECT 1", &token("SELECT 1")))
            .await;
        assert!(matches!(result, Err(ReplayError::NotConfigured)));
        assert_eq!(executor.acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let executor = ScriptedExecutor::new();
        let result = dispatcher(Some("secret"), &executor)
            .dispatch(&request("drop_sql", "SELECT 1", &token("SELECT 1")))
            .await;
        assert!(matches!(result, Err(ReplayError::UnknownRoute(_))));
        assert_eq!(executor.acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_rejects_bad_token_before_acquiring() {
        let executor = ScriptedExecutor::new();
        let result = dispatcher(Some("secret"), &executor)
            .dispatch(&request("execute_sql", "DELETE FROM users", "deadbeef"))
            .await;
        assert!(matches!(result, Err(ReplayError::SecurityRejected)));
        assert_eq!(executor.acquisitions(), 0);
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_is_malformed() {
        let executor = ScriptedExecutor::new();
        let result = dispatcher(Some("secret"), &executor)
            .dispatch(&request("execute_sql", "  ", &token("  ")))
            .await;
        assert!(matches!(result, Err(ReplayError::MalformedRequest(_))));
        assert_eq!(executor.acquisitions(), 0);
    }

    #[tokio::test]
    async fn test_explain_renders_result() {
        let executor = ScriptedExecutor::new().respond_to(
            "EXPLAIN",
            ResultSet::new(vec!["type".to_string()], vec![vec![serde_json::json!("ALL")]]),
        );
        let view = dispatcher(Some("secret"), &executor)
            .dispatch(&request("explain_sql", "SELECT 1", &token("SELECT 1")))
            .await
            .unwrap();

        assert_eq!(view.view, "panels/explain_sql");
        let body: serde_json::Value = serde_json::from_str(&view.body).unwrap();
        assert_eq!(body["query"], "SELECT 1");
        assert_eq!(body["time"], "10.00ms");
        assert_eq!(body["result"]["rows"][0][0], "ALL");
        assert_eq!(executor.statements(), vec!["EXPLAIN SELECT 1"]);
    }

    #[tokio::test]
    async fn test_executor_error_passes_through() {
        let executor = ScriptedExecutor::new().fail_on("SELECT", "table is locked");
        let result = dispatcher(Some("secret"), &executor)
            .dispatch(&request("execute_sql", "SELECT 1", &token("SELECT 1")))
            .await;
        match result {
            Err(ReplayError::Executor(err)) => {
                assert_eq!(err.to_string(), "Statement failed: table is locked")
            }
            other => panic!("expected executor error, got {:?}", other),
        }
    }
}
