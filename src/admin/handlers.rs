use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::{AppState, StatsSnapshot};
use crate::rewrite::RewriteDecision;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub upstream: String,
    pub policy: &'static str,
    pub skip_prefixed: bool,
    pub tenants: usize,
    pub requests: StatsSnapshot,
}

#[derive(Serialize)]
pub struct TenantView {
    pub id: String,
    pub name: String,
    pub accent: String,
    pub preview_host: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Serialize)]
pub struct ResolveResult {
    pub host: String,
    pub path: String,
    /// False when the path is excluded and never reaches the rewrite rule.
    pub in_scope: bool,
    pub decision: Option<RewriteDecision>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let runtime = state.runtime();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        upstream: runtime.upstream.to_string(),
        policy: runtime.rule.policy().as_str(),
        skip_prefixed: runtime.config.rewrite.skip_prefixed,
        tenants: runtime.rule.tenants().len(),
        requests: state.stats.snapshot(),
    })
}

pub async fn get_tenants(State(state): State<AppState>) -> Json<Vec<TenantView>> {
    let runtime = state.runtime();
    let tenants = runtime
        .rule
        .tenants()
        .iter()
        .map(|t| TenantView {
            id: t.id.clone(),
            name: t.name.clone(),
            accent: t.accent.clone(),
            preview_host: t.preview_host_pattern(),
        })
        .collect();
    Json(tenants)
}

/// Dry run of the rewrite for a host and path.
pub async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Json<ResolveResult> {
    let runtime = state.runtime();
    let path = origin_form(params.path);
    let bare_path = path.split('?').next().unwrap_or_default();
    let in_scope = runtime.scope.includes_path(bare_path);
    let decision = in_scope.then(|| runtime.rule.decide(&params.host, &path));

    Json(ResolveResult {
        host: params.host,
        path,
        in_scope,
        decision,
    })
}

/// Request targets always start with `/`; `dashboard` is read as `/dashboard`.
fn origin_form(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}
