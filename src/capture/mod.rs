//! # Capture
//!
//! Request-scoped recording of executed statements.
//!
//! ```ignore
//! let mut ctx = RequestContext::new(instrumentation.clone());
//! let rows = ctx.execute(conn.as_mut(), "SELECT * FROM users").await?;
//! // ... end of request
//! let heading = panel.heading(ctx.ledger());
//! let body = panel.content(ctx.ledger_mut())?;
//! ```

pub mod backtrace;
mod context;
mod ledger;
mod query;

pub use backtrace::{capture_frames, BacktraceFilter};
pub use context::{Instrumentation, RequestContext};
pub use ledger::QueryLedger;
pub use query::{CapturedQuery, LAST_PROFILE, PROFILING_OFF, PROFILING_ON};
