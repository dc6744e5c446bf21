//! Observability subsystem for querydeck
//!
//! Structured logging through `tracing`. Every event is tagged with an
//! [`Event`] name so the capture side and the replay side can be told
//! apart in the log stream.
//!
//! # Usage
//!
//! ```ignore
//! use querydeck::observability::{init_logging, LogFormat, Event};
//!
//! init_logging(LogFormat::Json);
//! tracing::info!(event = %Event::Serving, addr = "127.0.0.1:9292", "serving");
//! ```

mod events;

pub use events::Event;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "querydeck=info,tower_http=info";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than `json` is text
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Install the global tracing subscriber.
///
/// Safe to call more than once: later calls are ignored, which keeps tests
/// that share a process from panicking.
pub fn init_logging(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let _ = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
}
