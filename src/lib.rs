//! querydeck - request-scoped SQL capture with guarded replay
//!
//! Records every statement a request executes, summarizes them at the end
//! of the request, and lets a developer re-run a captured statement with
//! `EXPLAIN`, with profiling, or verbatim, provided the link carries a
//! token bound to the deployment's secret key.

pub mod capability;
pub mod capture;
pub mod cli;
pub mod config;
pub mod executor;
pub mod http_server;
pub mod observability;
pub mod panel;
pub mod render;
pub mod replay;
