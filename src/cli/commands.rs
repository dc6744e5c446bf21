//! CLI command implementations
//!
//! Every command resolves its key the same way: config file (if given),
//! then environment, then command-line flags.

use crate::capability::CapabilityValidator;
use crate::capture::CapturedQuery;
use crate::config::DeckConfig;
use crate::observability::{init_logging, LogFormat};
use crate::panel::replay_link;
use crate::replay::ReplayOperation;

use super::args::{Cli, Command, KeyArgs};
use super::errors::{CliError, CliResult};

/// Result of `verify`
pub const VALID: &str = "valid";
pub const INVALID: &str = "invalid";

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(LogFormat::from_name(&cli.log_format));
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Token { sql, key } => {
            println!("{}", token(&sql, &key)?);
            Ok(())
        }
        Command::Link {
            operation,
            sql,
            time,
            mount_path,
            key,
        } => {
            println!("{}", link(operation, &sql, time, mount_path.as_deref(), &key)?);
            Ok(())
        }
        Command::Verify { sql, hash, key } => {
            let valid = verify(&sql, &hash, &key)?;
            println!("{}", if valid { VALID } else { INVALID });
            if valid {
                Ok(())
            } else {
                Err(CliError::token_invalid())
            }
        }
    }
}

/// Capability token for `sql`
pub fn token(sql: &str, key: &KeyArgs) -> CliResult<String> {
    let (_, validator) = resolve(key)?;
    Ok(validator.token_for(sql)?.to_string())
}

/// Replay URL for `sql`
pub fn link(
    operation: ReplayOperation,
    sql: &str,
    time: f64,
    mount_path: Option<&str>,
    key: &KeyArgs,
) -> CliResult<String> {
    let (config, validator) = resolve(key)?;
    let mount = mount_path.unwrap_or_else(|| config.normalized_mount_path());
    let query = CapturedQuery::new(sql, time, Vec::new());
    Ok(replay_link(mount, operation, &query, &validator)?)
}

/// Whether `hash` authorizes `sql`
pub fn verify(sql: &str, hash: &str, key: &KeyArgs) -> CliResult<bool> {
    let (_, validator) = resolve(key)?;
    Ok(validator.is_valid(sql, hash)?)
}

fn resolve(key: &KeyArgs) -> CliResult<(DeckConfig, CapabilityValidator)> {
    let mut config = match &key.config {
        Some(path) => DeckConfig::load(path)?,
        None => DeckConfig::default(),
    };
    config.apply_env()?;

    if let Some(secret) = &key.secret_key {
        config.secret_key = Some(secret.clone());
    }
    if let Some(algorithm) = key.algorithm {
        config.token_algorithm = algorithm;
    }

    let validator = config.validator().ok_or_else(CliError::missing_secret)?;
    Ok((config, validator))
}
