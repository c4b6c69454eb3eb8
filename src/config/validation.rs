//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts and the tenant list
//! - Reject tenant ids the rewrite rule could never match
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::Authority;

use crate::config::schema::{ProxyConfig, RewritePolicy, ADMIN_KEY_PLACEHOLDER};
use crate::rewrite::TENANT_DELIMITER;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("upstream.address `{0}` is not a valid host:port authority")]
    InvalidUpstream(String),

    #[error("tenant id `{id}` is invalid: {reason}")]
    InvalidTenantId { id: String, reason: &'static str },

    #[error("tenant id `{0}` is listed more than once")]
    DuplicateTenant(String),

    #[error("rewrite.policy = \"allow_list\" requires at least one tenant")]
    EmptyAllowList,

    #[error("rewrite.exclude_paths entry `{0}` must start with `/`")]
    InvalidExcludePath(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("observability.log_format `{0}` is not one of \"pretty\", \"json\"")]
    InvalidLogFormat(String),

    #[error("admin.bind_address `{0}` is not a socket address")]
    InvalidAdminAddress(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    AdminKeyUnset,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.upstream.address.is_empty() || config.upstream.address.parse::<Authority>().is_err() {
        errors.push(ValidationError::InvalidUpstream(config.upstream.address.clone()));
    }

    let mut seen = HashSet::new();
    for tenant in &config.tenants {
        if let Err(reason) = check_tenant_id(&tenant.id) {
            errors.push(ValidationError::InvalidTenantId {
                id: tenant.id.clone(),
                reason,
            });
        }
        if !seen.insert(tenant.id.as_str()) {
            errors.push(ValidationError::DuplicateTenant(tenant.id.clone()));
        }
    }
    if config.rewrite.policy == RewritePolicy::AllowList && config.tenants.is_empty() {
        errors.push(ValidationError::EmptyAllowList);
    }

    for path in &config.rewrite.exclude_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidExcludePath(path.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::InvalidLogFormat(obs.log_format.clone()));
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAdminAddress(
                config.admin.bind_address.clone(),
            ));
        }
        if config.admin.api_key.is_empty() || config.admin.api_key == ADMIN_KEY_PLACEHOLDER {
            errors.push(ValidationError::AdminKeyUnset);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Tenant ids travel through DNS labels, which the host parser lowercases.
fn check_tenant_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("must not be empty");
    }
    if id.contains(TENANT_DELIMITER) {
        return Err("must not contain the `---` delimiter");
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
    {
        return Err("only lowercase letters, digits, `-` and `_` are allowed");
    }
    Ok(())
}
