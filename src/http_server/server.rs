//! # HTTP Server
//!
//! Health check plus the replay endpoints under the configured mount path.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::replay_routes::replay_routes;
use crate::observability::Event;
use crate::replay::ReplayDispatcher;

/// HTTP server for the replay endpoints
pub struct HttpServer {
    config: HttpServerConfig,
    mount_path: String,
    router: Router,
}

impl HttpServer {
    /// Create a server mounting `dispatcher` under `mount_path`
    pub fn new(
        config: HttpServerConfig,
        mount_path: &str,
        dispatcher: Arc<ReplayDispatcher>,
    ) -> Self {
        let router = Self::build_router(mount_path, dispatcher);
        Self {
            config,
            mount_path: mount_path.to_string(),
            router,
        }
    }

    /// Build the combined router
    pub fn build_router(mount_path: &str, dispatcher: Arc<ReplayDispatcher>) -> Router {
        let replay = replay_routes(dispatcher);
        let router = match mount_path.trim_end_matches('/') {
            // axum cannot nest at the root
            "" => Router::new().merge(health_routes()).merge(replay),
            mount => Router::new().merge(health_routes()).nest(mount, replay),
        };
        router.layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process exits
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            event = %Event::Serving,
            addr = %addr,
            mount = %self.mount_path,
            "serving replay endpoints"
        );
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}
