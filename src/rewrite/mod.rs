//! Tenant rewrite subsystem.
//!
//! # Data Flow
//! ```text
//! Host header (or URI host) + path
//!     → host.rs (normalize, public-suffix-aware subdomain)
//!     → decision.rs (split on `---`, gate, guard)
//!     → tenant.rs (allow-list lookup)
//!     → Return: PassThrough { reason } or Rewrite { tenant, path }
//! ```
//!
//! # Design Decisions
//! - Fail open: any host that cannot be parsed passes through untouched
//! - The rule owns no mutable state; a config reload builds a new rule
//! - Only the path changes, and only by prepending `/<tenant>`

pub mod decision;
pub mod host;
pub mod tenant;

pub use decision::{PassThroughReason, RewriteDecision, RewriteRule};
pub use tenant::{Tenant, TenantDirectory};

/// Separates the tenant id from the deployment slug in a preview subdomain.
pub const TENANT_DELIMITER: &str = "---";
