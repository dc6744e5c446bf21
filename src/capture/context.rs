//! Request Context
//!
//! Carries the ledger for one request through the host's call chain,
//! together with the process-wide instrumentation switch.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::backtrace::capture_frames;
use super::ledger::QueryLedger;
use super::query::CapturedQuery;
use crate::executor::{ExecutorResult, ResultSet, SqlConnection};
use crate::observability::Event;

/// Process-wide on/off switch for capture, checked on every record call
#[derive(Debug, Clone)]
pub struct Instrumentation {
    enabled: Arc<AtomicBool>,
}

impl Instrumentation {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn enabled() -> Self {
        Self::new(true)
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Affects every context sharing this switch
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::enabled()
    }
}

/// Per-request capture state
#[derive(Debug)]
pub struct RequestContext {
    /// Request ID for log correlation
    pub request_id: Uuid,
    instrumentation: Instrumentation,
    ledger: QueryLedger,
}

impl RequestContext {
    pub fn new(instrumentation: Instrumentation) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            instrumentation,
            ledger: QueryLedger::new(),
        }
    }

    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    pub fn ledger(&self) -> &QueryLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut QueryLedger {
        &mut self.ledger
    }

    pub fn queries(&self) -> &[CapturedQuery] {
        self.ledger.queries()
    }

    pub fn total_time_millis(&self) -> f64 {
        self.ledger.total_time_millis()
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
    }

    /// Time `work` and capture it as `sql`.
    ///
    /// Nothing is captured when instrumentation is off or when `work`
    /// returns an error; the error is returned unchanged.
    pub fn record<T, E, F>(
        &mut self,
        sql: impl Into<String>,
        backtrace: Vec<String>,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.instrumentation.is_enabled() {
            return work();
        }
        let started = Instant::now();
        let value = work();
        self.finish(sql.into(), backtrace, started, value.is_ok());
        value
    }

    /// Async form of [`record`](Self::record)
    pub async fn record_async<T, E, F, Fut>(
        &mut self,
        sql: impl Into<String>,
        backtrace: Vec<String>,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.instrumentation.is_enabled() {
            return work().await;
        }
        let started = Instant::now();
        let value = work().await;
        self.finish(sql.into(), backtrace, started, value.is_ok());
        value
    }

    /// Run `sql` on `conn`, capturing the caller's frames and timing
    pub async fn execute(
        &mut self,
        conn: &mut dyn SqlConnection,
        sql: &str,
    ) -> ExecutorResult<ResultSet> {
        let backtrace = if self.instrumentation.is_enabled() {
            capture_frames()
        } else {
            Vec::new()
        };
        let pending = conn.execute(sql);
        self.record_async(sql, backtrace, || pending).await
    }

    fn finish(&mut self, sql: String, backtrace: Vec<String>, started: Instant, completed: bool) {
        let elapsed = started.elapsed().as_secs_f64();
        if !completed {
            tracing::debug!(
                event = %Event::QueryCaptureSkipped,
                request_id = %self.request_id,
                "statement failed, not captured"
            );
            return;
        }
        tracing::trace!(
            event = %Event::QueryCaptured,
            request_id = %self.request_id,
            elapsed_ms = elapsed * 1000.0,
            "statement captured"
        );
        self.ledger.push(CapturedQuery::new(sql, elapsed, backtrace));
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Instrumentation::default())
    }
}
