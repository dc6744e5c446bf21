//! # SQL Panel
//!
//! End-of-request summary of the ledger. The panel is the only consumer
//! that retires ledger state: once its content has been rendered the
//! ledger is reset, so the same captures are never shown twice.

mod links;

pub use links::replay_link;

use std::sync::Arc;

use serde::Serialize;

use crate::capability::{CapabilityResult, CapabilityValidator};
use crate::capture::{BacktraceFilter, CapturedQuery, QueryLedger};
use crate::observability::Event;
use crate::render::{RenderError, RenderResult, RenderedView, ViewRenderer, ViewValues};
use crate::replay::ReplayOperation;

/// View used for the panel body
pub const PANEL_VIEW: &str = "panels/sql";

/// Panel errors
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Capability(#[from] crate::capability::CapabilityError),
}

/// Result type for panel operations
pub type PanelResult<T> = Result<T, PanelError>;

/// One ledger entry as presented to the view
#[derive(Debug, Clone, Serialize)]
pub struct PanelEntry {
    pub sql: String,
    pub time: String,
    pub elapsed_seconds: f64,
    pub inspectable: bool,
    pub has_backtrace: bool,
    pub backtrace: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PanelLinks>,
}

/// Replay URLs for one entry; explain/profile only for read-only statements
#[derive(Debug, Clone, Serialize)]
pub struct PanelLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub execute: String,
}

/// Facade over a request's ledger
pub struct SqlPanel {
    renderer: Arc<dyn ViewRenderer>,
    filter: BacktraceFilter,
    validator: Option<CapabilityValidator>,
    mount_path: String,
}

impl SqlPanel {
    pub fn new(
        renderer: Arc<dyn ViewRenderer>,
        filter: BacktraceFilter,
        validator: Option<CapabilityValidator>,
        mount_path: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            filter,
            validator,
            mount_path: mount_path.into(),
        }
    }

    /// e.g. `3 Queries (12.50ms)`
    pub fn heading(&self, ledger: &QueryLedger) -> String {
        format!("{} Queries ({:.2}ms)", ledger.len(), ledger.total_time_millis())
    }

    /// Render every entry, then reset the ledger.
    ///
    /// On error the ledger is left untouched.
    pub fn content(&self, ledger: &mut QueryLedger) -> PanelResult<RenderedView> {
        let entries = ledger
            .queries()
            .iter()
            .map(|query| self.entry(query))
            .collect::<CapabilityResult<Vec<_>>>()?;

        let values = ViewValues::new()
            .with("heading", &self.heading(ledger))?
            .with("total_time_ms", &ledger.total_time_millis())?
            .with("queries", &entries)?;
        let view = self.render(&values)?;

        tracing::debug!(event = %Event::PanelRendered, entries = entries.len(), "panel rendered");
        ledger.reset();
        tracing::debug!(event = %Event::LedgerReset, "ledger reset");
        Ok(view)
    }

    fn render(&self, values: &ViewValues) -> RenderResult<RenderedView> {
        self.renderer.render(PANEL_VIEW, values)
    }

    fn entry(&self, query: &CapturedQuery) -> CapabilityResult<PanelEntry> {
        let inspectable = query.is_inspectable();
        let links = match &self.validator {
            Some(validator) => Some(self.links(query, inspectable, validator)?),
            None => None,
        };
        Ok(PanelEntry {
            sql: query.sql().to_string(),
            time: query.human_time(),
            elapsed_seconds: query.elapsed_seconds(),
            inspectable,
            has_backtrace: query.has_backtrace(&self.filter),
            backtrace: query
                .filtered_backtrace(&self.filter)
                .into_iter()
                .map(str::to_string)
                .collect(),
            links,
        })
    }

    fn links(
        &self,
        query: &CapturedQuery,
        inspectable: bool,
        validator: &CapabilityValidator,
    ) -> CapabilityResult<PanelLinks> {
        let link = |op: ReplayOperation| -> CapabilityResult<Option<String>> {
            if op.requires_inspectable() && !inspectable {
                return Ok(None);
            }
            replay_link(&self.mount_path, op, query, validator).map(Some)
        };
        Ok(PanelLinks {
            explain: link(ReplayOperation::Explain)?,
            profile: link(ReplayOperation::Profile)?,
            execute: replay_link(&self.mount_path, ReplayOperation::Execute, query, validator)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SecretKey;
    use crate::render::JsonRenderer;
    use serde_json::Value;

    fn panel(secret: Option<&str>) -> SqlPanel {
        SqlPanel::new(
            Arc::new(JsonRenderer::new()),
            BacktraceFilter::new("/srv/app"),
            SecretKey::from_optional(secret).map(CapabilityValidator::sha1),
            "/__querydeck__",
        )
    }

    struct FailingRenderer;

    impl ViewRenderer for FailingRenderer {
        fn render(&self, view: &str, _: &ViewValues) -> RenderResult<RenderedView> {
            Err(RenderError::UnknownView(view.to_string()))
        }
    }

    #[test]
    fn test_heading() {
        let mut ledger = QueryLedger::new();
        ledger.push(CapturedQuery::new("SELECT 1", 0.015, vec![]));
        assert_eq!(panel(None).heading(&ledger), "1 Queries (15.00ms)");
    }

    #[test]
    fn test_heading_empty() {
        assert_eq!(panel(None).heading(&QueryLedger::new()), "0 Queries (0.00ms)");
    }

    #[test]
    fn test_content_resets_ledger() {
        let mut ledger = QueryLedger::new();
        ledger.push(CapturedQuery::new("SELECT 1", 0.001, vec![]));
        ledger.push(CapturedQuery::new("UPDATE t SET a = 1", 0.002, vec![]));

        let view = panel(Some("secret")).content(&mut ledger).unwrap();
        assert!(ledger.is_empty());

        let body: Value = serde_json::from_str(&view.body).unwrap();
        assert_eq!(body["view"], PANEL_VIEW);
        assert_eq!(body["heading"], "2 Queries (3.00ms)");
        assert_eq!(body["queries"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_links_only_for_inspectable() {
        let mut ledger = QueryLedger::new();
        ledger.push(CapturedQuery::new("SELECT 1", 0.0, vec![]));
        ledger.push(CapturedQuery::new("UPDATE t SET a = 1", 0.0, vec![]));

        let view = panel(Some("secret")).content(&mut ledger).unwrap();
        let body: Value = serde_json::from_str(&view.body).unwrap();

        let select = &body["queries"][0]["links"];
        assert!(select["explain"].as_str().unwrap().contains("/explain_sql?"));
        assert!(select["profile"].as_str().unwrap().contains("/profile_sql?"));

        let update = &body["queries"][1]["links"];
        assert!(update.get("explain").is_none());
        assert!(update.get("profile").is_none());
        assert!(update["execute"].as_str().unwrap().contains("/execute_sql?"));
    }

    #[test]
    fn test_no_links_without_secret() {
        let mut ledger = QueryLedger::new();
        ledger.push(CapturedQuery::new("SELECT 1", 0.0, vec![]));
        let view = panel(None).content(&mut ledger).unwrap();
        let body: Value = serde_json::from_str(&view.body).unwrap();
        assert!(body["queries"][0].get("links").is_none());
    }

    #[test]
    fn test_backtrace_filtered_in_entry() {
        let mut ledger = QueryLedger::new();
        ledger.push(CapturedQuery::new(
            "SELECT 1",
            0.0,
            vec![
                "/srv/app/vendor/orm.rs:1:1".to_string(),
                "/srv/app/src/users.rs:5:3".to_string(),
            ],
        ));
        let view = panel(None).content(&mut ledger).unwrap();
        let body: Value = serde_json::from_str(&view.body).unwrap();
        assert_eq!(body["queries"][0]["has_backtrace"], true);
        assert_eq!(body["queries"][0]["backtrace"][0], "/srv/app/src/users.rs:5:3");
        assert_eq!(body["queries"][0]["backtrace"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_render_failure_keeps_ledger() {
        let panel = SqlPanel::new(
            Arc::new(FailingRenderer),
            BacktraceFilter::new("/srv/app"),
            None,
            "/__querydeck__",
        );
        let mut ledger = QueryLedger::new();
        ledger.push(CapturedQuery::new("SELECT 1", 0.0, vec![]));
        assert!(panel.content(&mut ledger).is_err());
        assert_eq!(ledger.len(), 1);
    }
}
