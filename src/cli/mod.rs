//! CLI module for querydeck
//!
//! Developer tooling around capability tokens:
//! - token: compute the token for a statement
//! - link: build a replay URL
//! - verify: check a presented token

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, KeyArgs};
pub use commands::{link, run, run_command, token, verify};
pub use errors::{CliError, CliErrorCode, CliResult};
