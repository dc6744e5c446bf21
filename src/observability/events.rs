//! Lifecycle events for querydeck
//!
//! Every log line emitted by the crate carries one of these as its
//! `event` field, so log consumers can filter on a stable name.

use std::fmt;

/// Observable events in querydeck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Capture
    /// A statement completed and was appended to the ledger
    QueryCaptured,
    /// A wrapped statement failed; nothing was captured
    QueryCaptureSkipped,
    /// Ledger emptied after display
    LedgerReset,

    // Panel
    /// Panel content rendered
    PanelRendered,

    // Replay
    /// Replay request received
    ReplayReceived,
    /// Replay operation completed
    ReplayDispatched,
    /// Presented capability token did not match
    ReplayRejected,
    /// Replay subsystem disabled or path unrecognized
    ReplayNotFound,
    /// Replay request was malformed
    ReplayMalformed,
    /// Database or renderer failed during replay
    ReplayFailed,

    // Server
    /// HTTP server bound and serving
    Serving,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::QueryCaptured => "QUERY_CAPTURED",
            Event::QueryCaptureSkipped => "QUERY_CAPTURE_SKIPPED",
            Event::LedgerReset => "LEDGER_RESET",

            Event::PanelRendered => "PANEL_RENDERED",

            Event::ReplayReceived => "REPLAY_RECEIVED",
            Event::ReplayDispatched => "REPLAY_DISPATCHED",
            Event::ReplayRejected => "REPLAY_REJECTED",
            Event::ReplayNotFound => "REPLAY_NOT_FOUND",
            Event::ReplayMalformed => "REPLAY_MALFORMED",
            Event::ReplayFailed => "REPLAY_FAILED",

            Event::Serving => "QUERYDECK_SERVING",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::QueryCaptured,
            Event::QueryCaptureSkipped,
            Event::LedgerReset,
            Event::PanelRendered,
            Event::ReplayReceived,
            Event::ReplayDispatched,
            Event::ReplayRejected,
            Event::ReplayNotFound,
            Event::ReplayMalformed,
            Event::ReplayFailed,
            Event::Serving,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_rejection_distinct_from_not_found() {
        assert_ne!(Event::ReplayRejected.as_str(), Event::ReplayNotFound.as_str());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(format!("{}", Event::LedgerReset), "LEDGER_RESET");
    }
}
