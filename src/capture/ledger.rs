//! Query Ledger
//!
//! Ordered list of the statements captured for one request. The ledger is
//! a plain value owned by the request's [`RequestContext`](super::RequestContext);
//! there is no ambient per-thread store.

use serde::Serialize;

use super::query::CapturedQuery;

/// Captured statements of one request, in capture order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct QueryLedger {
    entries: Vec<CapturedQuery>,
}

impl QueryLedger {
    /// Empty ledger; allocates nothing until the first capture
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, query: CapturedQuery) {
        self.entries.push(query);
    }

    /// Entries in insertion order
    pub fn queries(&self) -> &[CapturedQuery] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Idempotent.
    pub fn reset(&mut self) {
        self.entries = Vec::new();
    }

    /// Sum of all entries' durations in milliseconds; 0 when empty
    pub fn total_time_millis(&self) -> f64 {
        self.entries.iter().map(CapturedQuery::elapsed_millis).sum()
    }
}

impl<'a> IntoIterator for &'a QueryLedger {
    type Item = &'a CapturedQuery;
    type IntoIter = std::slice::Iter<'a, CapturedQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
