//! Tenant preview proxy library.
//!
//! Routes `<tenant>---<deployment>.<domain>` preview hosts to a single
//! application by internally rewriting the path to `/<tenant>/...`.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::{RewriteDecision, RewriteRule};
