//! Replay HTTP Routes
//!
//! One wildcard route per mount: the dispatcher, not the router, decides
//! which paths name an operation, so unknown paths and rejected tokens
//! take the same code path and produce the same response.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::replay::{ReplayDispatcher, ReplayError, ReplayParams, ReplayRequest};

/// Routes to be nested under the mount path
pub fn replay_routes(dispatcher: Arc<ReplayDispatcher>) -> Router {
    Router::new()
        .route("/*path", get(replay_handler))
        .with_state(dispatcher)
}

async fn replay_handler(
    State(dispatcher): State<Arc<ReplayDispatcher>>,
    Path(path): Path<String>,
    Query(params): Query<ReplayParams>,
) -> Result<Response, ReplayError> {
    let view = dispatcher
        .dispatch(&ReplayRequest::new(path, params))
        .await?;

    Ok(([(header::CONTENT_TYPE, view.content_type)], view.body).into_response())
}
