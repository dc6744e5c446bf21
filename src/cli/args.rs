//! CLI argument definitions using clap
//!
//! Commands:
//! - querydeck token --sql <SQL>
//! - querydeck link --operation <OP> --sql <SQL> [--time <SECONDS>]
//! - querydeck verify --sql <SQL> --hash <TOKEN>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::capability::TokenAlgorithm;
use crate::replay::ReplayOperation;

/// querydeck - capability tokens and replay links for captured SQL
#[derive(Parser, Debug)]
#[command(name = "querydeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the secret key and token algorithm come from
#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Secret key; overrides the config file and environment
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Token algorithm: sha1 or hmac-sha256
    #[arg(long, value_parser = parse_algorithm)]
    pub algorithm: Option<TokenAlgorithm>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the capability token for a statement
    Token {
        /// Statement text, byte for byte as captured
        #[arg(long)]
        sql: String,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Print a replay URL for a statement
    Link {
        /// explain_sql, profile_sql or execute_sql
        #[arg(long, value_parser = parse_operation)]
        operation: ReplayOperation,

        #[arg(long)]
        sql: String,

        /// Recorded duration in seconds
        #[arg(long, default_value_t = 0.0)]
        time: f64,

        /// Overrides the configured mount path
        #[arg(long)]
        mount_path: Option<String>,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Check a presented token; exits non-zero when invalid
    Verify {
        #[arg(long)]
        sql: String,

        #[arg(long)]
        hash: String,

        #[command(flatten)]
        key: KeyArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_algorithm(raw: &str) -> Result<TokenAlgorithm, String> {
    raw.parse().map_err(|e: crate::capability::CapabilityError| e.to_string())
}

fn parse_operation(raw: &str) -> Result<ReplayOperation, String> {
    ReplayOperation::ALL
        .into_iter()
        .find(|op| op.as_str() == raw)
        .ok_or_else(|| format!("unknown operation '{}'", raw))
}
