//! Admin API.
//!
//! Read-only JSON endpoints behind a bearer key: status and counters, the
//! tenant directory, and a dry run of the rewrite rule.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/tenants", get(get_tenants))
        .route("/admin/resolve", get(resolve))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
