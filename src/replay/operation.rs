//! Replay operations and the request that selects one

use std::fmt;

use serde::Deserialize;

/// The three diagnostic operations a captured statement can be replayed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplayOperation {
    Explain,
    Profile,
    Execute,
}

impl ReplayOperation {
    pub const ALL: [ReplayOperation; 3] = [
        ReplayOperation::Explain,
        ReplayOperation::Profile,
        ReplayOperation::Execute,
    ];

    /// Path segment of the endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayOperation::Explain => "explain_sql",
            ReplayOperation::Profile => "profile_sql",
            ReplayOperation::Execute => "execute_sql",
        }
    }

    /// View the result is rendered with
    pub fn view_name(&self) -> &'static str {
        match self {
            ReplayOperation::Explain => "panels/explain_sql",
            ReplayOperation::Profile => "panels/profile_sql",
            ReplayOperation::Execute => "panels/execute_sql",
        }
    }

    /// Whether the panel offers this operation only for read-only statements
    pub fn requires_inspectable(&self) -> bool {
        !matches!(self, ReplayOperation::Execute)
    }

    /// Select an operation by the last segment of `path`
    pub fn from_path(path: &str) -> Option<Self> {
        let last = path.trim_end_matches('/').rsplit('/').next()?;
        Self::ALL.into_iter().find(|op| op.as_str() == last)
    }
}

impl fmt::Display for ReplayOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-string parameters of a replay endpoint; absent ones are empty
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub hash: String,
}

/// Everything the dispatcher needs from one HTTP interaction
#[derive(Debug, Clone)]
pub struct ReplayRequest {
    pub path: String,
    pub params: ReplayParams,
}

impl ReplayRequest {
    pub fn new(path: impl Into<String>, params: ReplayParams) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }

    /// Elapsed seconds from the `time` parameter.
    ///
    /// Unparseable, negative or non-finite input yields 0.
    pub fn elapsed_seconds(&self) -> f64 {
        parse_elapsed(&self.params.time)
    }
}

pub fn parse_elapsed(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => secs,
        _ => 0.0,
    }
}
