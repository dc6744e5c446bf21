//! Replay links
//!
//! URLs the panel hands to the developer for each captured statement.

use url::form_urlencoded;

use crate::capability::{CapabilityResult, CapabilityValidator};
use crate::capture::CapturedQuery;
use crate::replay::ReplayOperation;

/// Build `<mount>/<operation>?query=..&time=..&hash=..`
pub fn replay_link(
    mount_path: &str,
    operation: ReplayOperation,
    query: &CapturedQuery,
    validator: &CapabilityValidator,
) -> CapabilityResult<String> {
    let token = query.capability_token(validator)?;
    let params = form_urlencoded::Serializer::new(String::new())
        .append_pair("query", query.sql())
        .append_pair("time", &query.elapsed_seconds().to_string())
        .append_pair("hash", token.as_str())
        .finish();
    Ok(format!(
        "{}/{}?{}",
        mount_path.trim_end_matches('/'),
        operation.as_str(),
        params
    ))
}
