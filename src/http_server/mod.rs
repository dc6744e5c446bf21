//! # HTTP Server Module
//!
//! Exposes the replay dispatcher over HTTP.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `<mount>/explain_sql`, `<mount>/profile_sql`, `<mount>/execute_sql`

pub mod config;
pub mod health_routes;
pub mod replay_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::HttpServer;
