//! # Replay
//!
//! Guarded re-execution of captured statements: `explain_sql`,
//! `profile_sql` and `execute_sql`.

mod dispatcher;
mod errors;
mod operation;

pub use dispatcher::ReplayDispatcher;
pub use errors::{ErrorResponse, ReplayError, ReplayResult};
pub use operation::{parse_elapsed, ReplayOperation, ReplayParams, ReplayRequest};
