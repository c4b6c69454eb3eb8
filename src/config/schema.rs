//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the preview proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// The single application every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Hostname-to-path rewrite settings.
    pub rewrite: RewriteConfig,

    /// Known tenants and their display metadata.
    pub tenants: Vec<TenantConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            rewrite: RewriteConfig::default(),
            tenants: TenantConfig::defaults(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address as `host:port` (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// How a tenant candidate parsed out of the host is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RewritePolicy {
    /// Only tenants listed in `tenants` are rewritten.
    #[default]
    AllowList,
    /// Any non-empty candidate is rewritten.
    Unconditional,
}

impl RewritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewritePolicy::AllowList => "allow_list",
            RewritePolicy::Unconditional => "unconditional",
        }
    }
}

/// Rewrite rule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Tenant validation policy.
    pub policy: RewritePolicy,

    /// Leave paths that already start with `/<tenant>` untouched.
    pub skip_prefixed: bool,

    /// Require `/<tenant>` to be a whole path segment for the guard to apply
    /// (`/allocations` is then not prefixed by `all`).
    pub segment_prefix_match: bool,

    /// Treat private public-suffix entries (e.g. `vercel.app`) as suffixes.
    pub include_private_domains: bool,

    /// Path prefixes that never reach the rewrite rule.
    pub exclude_paths: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            policy: RewritePolicy::AllowList,
            skip_prefixed: true,
            segment_prefix_match: false,
            include_private_domains: false,
            exclude_paths: vec![
                "/api".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
        }
    }
}

/// A tenant known to the application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TenantConfig {
    /// Identifier used in preview hosts and path prefixes.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Accent color used by the UI.
    #[serde(default = "default_accent")]
    pub accent: String,
}

fn default_accent() -> String {
    "neutral".to_string()
}

impl TenantConfig {
    fn new(id: &str, name: &str, accent: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            accent: accent.to_string(),
        }
    }

    /// The tenants shipped with the demo application.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("acme", "Acme Corp", "blue"),
            Self::new("globex", "Globex", "purple"),
            Self::new("initech", "Initech", "emerald"),
            Self::new("all", "All Tenants", "neutral"),
        ]
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Placeholder key that must be replaced before the admin API is enabled.
pub const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: ADMIN_KEY_PLACEHOLDER.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
