//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Decide the tenant rewrite for every in-scope request
//! - Forward requests to the upstream application, host untouched
//! - Apply configuration reloads atomically
//! - Serve the admin API next to the edge listener

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        request::Parts,
        uri::{Authority, Scheme},
        HeaderValue, Request, Uri, Version,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::{ConfigError, ProxyConfig};
use crate::http::request::{
    make_request_span, propagate_request_id_layer, request_id, set_request_id_layer,
};
use crate::http::response::{strip_hop_by_hop, ProxyError};
use crate::lifecycle::shutdown::recv_shutdown;
use crate::observability::metrics::{self, OUTCOME_EXCLUDED};
use crate::rewrite::host::request_host;
use crate::rewrite::{RewriteDecision, RewriteRule};
use crate::routing::RewriteScope;

/// Everything a request needs, compiled from one validated config.
#[derive(Debug)]
pub struct RuntimeState {
    pub config: ProxyConfig,
    pub rule: RewriteRule,
    pub scope: RewriteScope,
    pub upstream: Authority,
}

impl RuntimeState {
    pub fn from_config(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let upstream = config.upstream.address.parse::<Authority>().map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidUpstream(
                config.upstream.address.clone(),
            )])
        })?;

        Ok(Self {
            rule: RewriteRule::from_config(&config),
            scope: RewriteScope::from_config(&config.rewrite),
            upstream,
            config,
        })
    }
}

/// Request counters, by what happened to the path.
#[derive(Debug, Default)]
pub struct RequestStats {
    total: AtomicU64,
    rewritten: AtomicU64,
    passed_through: AtomicU64,
    excluded: AtomicU64,
}

/// Point-in-time copy of [`RequestStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub rewritten: u64,
    pub passed_through: u64,
    pub excluded: u64,
}

impl RequestStats {
    fn record(&self, decision: &RewriteDecision) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if decision.is_rewrite() {
            self.rewritten.fetch_add(1, Ordering::Relaxed);
        } else {
            self.passed_through.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_excluded(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.excluded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            rewritten: self.rewritten.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RuntimeState>>,
    pub client: Client<HttpConnector, Body>,
    pub stats: Arc<RequestStats>,
}

impl AppState {
    pub fn new(runtime: RuntimeState) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            inner: Arc::new(ArcSwap::from_pointee(runtime)),
            client,
            stats: Arc::new(RequestStats::default()),
        }
    }

    /// The current runtime snapshot. Stays valid across reloads.
    pub fn runtime(&self) -> Arc<RuntimeState> {
        self.inner.load_full()
    }

    /// Validate `config` and make it the current runtime snapshot.
    ///
    /// Listener-level settings (addresses, timeout, body limit) are bound at
    /// startup and only change on restart.
    pub fn apply_config(&self, config: ProxyConfig) -> Result<(), ConfigError> {
        let next = RuntimeState::from_config(config)?;
        let current = self.runtime();

        if next.config.listener.bind_address != current.config.listener.bind_address
            || next.config.admin.bind_address != current.config.admin.bind_address
            || next.config.admin.enabled != current.config.admin.enabled
            || next.config.timeouts.request_secs != current.config.timeouts.request_secs
            || next.config.listener.max_body_bytes != current.config.listener.max_body_bytes
        {
            tracing::warn!("Listener settings changed; they take effect after a restart");
        }

        tracing::info!(
            policy = next.rule.policy().as_str(),
            tenants = next.rule.tenants().len(),
            upstream = %next.upstream,
            "Configuration applied"
        );
        self.inner.store(Arc::new(next));
        Ok(())
    }
}

/// HTTP edge server for the preview proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let router_config = config.clone();
        let state = AppState::new(RuntimeState::from_config(config)?);
        let router = Self::build_router(&router_config, state.clone());

        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Shared state, for embedding and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations arriving on `config_updates` replace the runtime snapshot;
    /// invalid ones are logged and dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let runtime = self.state.runtime();
        tracing::info!(
            address = %addr,
            upstream = %runtime.upstream,
            policy = runtime.rule.policy().as_str(),
            "HTTP server starting"
        );

        let reload_state = self.state.clone();
        let reload = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = reload_state.apply_config(config) {
                    tracing::error!(error = %e, "Rejected configuration update");
                }
            }
        });

        let admin = if runtime.config.admin.enabled {
            let admin_listener = TcpListener::bind(&runtime.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let admin_router = setup_admin_router(self.state.clone());
            let admin_shutdown = shutdown.resubscribe();
            Some(tokio::spawn(async move {
                axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(recv_shutdown(admin_shutdown))
                    .await
            }))
        } else {
            None
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        reload.abort();
        if let Some(admin) = admin {
            match admin.await {
                Ok(Err(e)) => tracing::error!(error = %e, "Admin API stopped with error"),
                Err(e) if !e.is_cancelled() => tracing::error!(error = %e, "Admin API task failed"),
                _ => {}
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Decides the rewrite, then forwards to the upstream application.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let runtime = state.runtime();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();
    let host = request_host(request.headers(), request.uri()).map(str::to_string);
    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let (outcome, target) = if runtime.scope.includes(&request) {
        let decision = runtime
            .rule
            .decide(host.as_deref().unwrap_or_default(), &original);
        state.stats.record(&decision);
        metrics::record_decision(decision.outcome());
        tracing::debug!(
            request_id = %request_id,
            host = host.as_deref().unwrap_or_default(),
            path = %original,
            outcome = decision.outcome(),
            "Rewrite decision"
        );

        match decision {
            RewriteDecision::Rewrite { path, .. } => ("rewritten", path),
            RewriteDecision::PassThrough { reason } => (reason.as_str(), original),
        }
    } else {
        state.stats.record_excluded();
        metrics::record_decision(OUTCOME_EXCLUDED);
        (OUTCOME_EXCLUDED, original)
    };

    match forward(&state, &runtime.upstream, request, &target).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), outcome, start_time);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), outcome, start_time);
            response
        }
    }
}

/// Send `request` to `upstream` with `path_and_query` as its target.
async fn forward(
    state: &AppState,
    upstream: &Authority,
    request: Request<Body>,
    path_and_query: &str,
) -> Result<Response, ProxyError> {
    let (mut parts, body) = request.into_parts();
    preserve_host(&mut parts);

    parts.uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(upstream.clone())
        .path_and_query(path_and_query)
        .build()?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);

    let response: hyper::Response<hyper::body::Incoming> =
        state.client.request(Request::from_parts(parts, body)).await?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(body)))
}

/// Copy the client's URI authority, port included, into a missing `Host`.
///
/// HTTP/2 clients send `:authority` instead of `Host`; the app must still see
/// the host the client used. Runs before the URI is pointed at the upstream.
fn preserve_host(parts: &mut Parts) {
    if parts.headers.contains_key(header::HOST) {
        return;
    }
    if let Some(value) = parts
        .uri
        .authority()
        .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
    {
        parts.headers.insert(header::HOST, value);
    }
}
