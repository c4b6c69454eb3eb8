//! The per-request rewrite decision.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{ProxyConfig, RewritePolicy};
use crate::rewrite::host::{normalize_host, subdomain};
use crate::rewrite::tenant::TenantDirectory;
use crate::rewrite::TENANT_DELIMITER;

/// Why a request is forwarded unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughReason {
    /// The host has nothing below its registrable domain.
    NoSubdomain,
    /// The subdomain carries no `---` delimiter.
    NoDelimiter,
    /// The subdomain starts with the delimiter.
    EmptyTenant,
    /// The candidate is not in the allow-list.
    UnknownTenant,
    /// The path already starts with `/<tenant>`.
    AlreadyPrefixed,
}

impl PassThroughReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassThroughReason::NoSubdomain => "no_subdomain",
            PassThroughReason::NoDelimiter => "no_delimiter",
            PassThroughReason::EmptyTenant => "empty_tenant",
            PassThroughReason::UnknownTenant => "unknown_tenant",
            PassThroughReason::AlreadyPrefixed => "already_prefixed",
        }
    }
}

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RewriteDecision {
    /// Forward the request as-is.
    PassThrough { reason: PassThroughReason },
    /// Serve the request as if it had asked for `path`. Host stays untouched.
    Rewrite { tenant: String, path: String },
}

impl RewriteDecision {
    fn pass(reason: PassThroughReason) -> Self {
        RewriteDecision::PassThrough { reason }
    }

    /// Label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RewriteDecision::PassThrough { reason } => reason.as_str(),
            RewriteDecision::Rewrite { .. } => "rewritten",
        }
    }

    pub fn is_rewrite(&self) -> bool {
        matches!(self, RewriteDecision::Rewrite { .. })
    }
}

/// The hostname-to-path rewrite rule.
///
/// Pure: the decision depends only on the host, the path and the immutable
/// settings captured at construction.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    policy: RewritePolicy,
    skip_prefixed: bool,
    segment_prefix_match: bool,
    include_private_domains: bool,
    tenants: Arc<TenantDirectory>,
}

impl RewriteRule {
    pub fn new(
        policy: RewritePolicy,
        skip_prefixed: bool,
        include_private_domains: bool,
        tenants: Arc<TenantDirectory>,
    ) -> Self {
        Self {
            policy,
            skip_prefixed,
            segment_prefix_match: false,
            include_private_domains,
            tenants,
        }
    }

    /// Only treat the path as prefixed when `/<tenant>` is a whole segment.
    pub fn with_segment_prefix_match(mut self, enabled: bool) -> Self {
        self.segment_prefix_match = enabled;
        self
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(
            config.rewrite.policy,
            config.rewrite.skip_prefixed,
            config.rewrite.include_private_domains,
            Arc::new(TenantDirectory::from_config(&config.tenants)),
        )
        .with_segment_prefix_match(config.rewrite.segment_prefix_match)
    }

    pub fn policy(&self) -> RewritePolicy {
        self.policy
    }

    pub fn tenants(&self) -> &TenantDirectory {
        &self.tenants
    }

    /// Decide how to serve `path` (query string included) requested on `host`.
    ///
    /// Never fails: every malformed input degrades to a pass-through.
    pub fn decide(&self, host: &str, path: &str) -> RewriteDecision {
        let Some(host) = normalize_host(host) else {
            return RewriteDecision::pass(PassThroughReason::NoSubdomain);
        };
        let subdomain = subdomain(&host, self.include_private_domains);
        if subdomain.is_empty() {
            return RewriteDecision::pass(PassThroughReason::NoSubdomain);
        }

        let Some((candidate, _deployment)) = subdomain.split_once(TENANT_DELIMITER) else {
            return RewriteDecision::pass(PassThroughReason::NoDelimiter);
        };
        if candidate.is_empty() {
            return RewriteDecision::pass(PassThroughReason::EmptyTenant);
        }

        if self.policy == RewritePolicy::AllowList && !self.tenants.contains(candidate) {
            return RewriteDecision::pass(PassThroughReason::UnknownTenant);
        }

        if self.skip_prefixed && self.has_tenant_prefix(path, candidate) {
            return RewriteDecision::pass(PassThroughReason::AlreadyPrefixed);
        }

        RewriteDecision::Rewrite {
            tenant: candidate.to_string(),
            path: format!("/{candidate}{path}"),
        }
    }

    fn has_tenant_prefix(&self, path: &str, tenant: &str) -> bool {
        let rest = path.strip_prefix('/').and_then(|rest| rest.strip_prefix(tenant));
        if !self.segment_prefix_match {
            return rest.is_some();
        }
        rest.is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TenantConfig;

    fn rule(policy: RewritePolicy, skip_prefixed: bool) -> RewriteRule {
        RewriteRule::new(
            policy,
            skip_prefixed,
            false,
            Arc::new(TenantDirectory::from_config(&TenantConfig::defaults())),
        )
    }

    fn guarded() -> RewriteRule {
        rule(RewritePolicy::AllowList, true)
    }

    fn unguarded() -> RewriteRule {
        rule(RewritePolicy::Unconditional, false)
    }

    fn rewrite(tenant: &str, path: &str) -> RewriteDecision {
        RewriteDecision::Rewrite {
            tenant: tenant.to_string(),
            path: path.to_string(),
        }
    }

    fn pass(reason: PassThroughReason) -> RewriteDecision {
        RewriteDecision::PassThrough { reason }
    }

    #[test]
    fn bare_domain_passes_through() {
        for rule in [guarded(), unguarded()] {
            assert_eq!(
                rule.decide("example.dev", "/dashboard"),
                pass(PassThroughReason::NoSubdomain)
            );
        }
    }

    #[test]
    fn subdomain_without_delimiter_passes_through() {
        for rule in [guarded(), unguarded()] {
            assert_eq!(
                rule.decide("acme.example.dev", "/dashboard"),
                pass(PassThroughReason::NoDelimiter)
            );
            assert_eq!(
                rule.decide("my-app-abc123.example.dev", "/"),
                pass(PassThroughReason::NoDelimiter)
            );
        }
    }

    #[test]
    fn known_tenant_is_rewritten() {
        assert_eq!(
            guarded().decide("acme---my-app-abc123.example.dev", "/dashboard"),
            rewrite("acme", "/acme/dashboard")
        );
    }

    #[test]
    fn unknown_tenant_depends_on_policy() {
        let host = "unknown---my-app-abc123.example.dev";
        assert_eq!(
            guarded().decide(host, "/x"),
            pass(PassThroughReason::UnknownTenant)
        );
        assert_eq!(unguarded().decide(host, "/x"), rewrite("unknown", "/unknown/x"));
    }

    #[test]
    fn prefixed_path_depends_on_guard() {
        let host = "acme---my-app.example.dev";
        assert_eq!(
            guarded().decide(host, "/acme/dashboard"),
            pass(PassThroughReason::AlreadyPrefixed)
        );
        assert_eq!(
            unguarded().decide(host, "/acme/dashboard"),
            rewrite("acme", "/acme/acme/dashboard")
        );
    }

    #[test]
    fn guard_is_a_raw_prefix_by_default() {
        assert_eq!(
            guarded().decide("all---my-app.example.dev", "/allocations"),
            pass(PassThroughReason::AlreadyPrefixed)
        );
        assert_eq!(
            guarded().decide("acme---my-app.example.dev", "/acmeblog"),
            pass(PassThroughReason::AlreadyPrefixed)
        );
        assert_eq!(
            guarded().decide("acme---my-app.example.dev", "/blog/acme"),
            rewrite("acme", "/acme/blog/acme")
        );
    }

    #[test]
    fn segment_guard_matches_whole_segments() {
        let rule = guarded().with_segment_prefix_match(true);
        let host = "all---my-app.example.dev";
        assert_eq!(
            rule.decide(host, "/allocations"),
            rewrite("all", "/all/allocations")
        );
        for path in ["/all", "/all/", "/all?tab=1", "/all#top"] {
            assert_eq!(
                rule.decide(host, path),
                pass(PassThroughReason::AlreadyPrefixed),
                "path {path}"
            );
        }
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let host = "globex---my-app.example.dev";
        for rule in [guarded(), guarded().with_segment_prefix_match(true)] {
            for path in ["/", "/settings", "/dashboard?range=7d", "/globex", ""] {
                let once = match rule.decide(host, path) {
                    RewriteDecision::Rewrite { path, .. } => path,
                    RewriteDecision::PassThrough { .. } => path.to_string(),
                };
                assert_eq!(
                    rule.decide(host, &once),
                    pass(PassThroughReason::AlreadyPrefixed),
                    "second application on {once} must be a no-op"
                );
            }
        }
    }

    #[test]
    fn query_string_is_preserved() {
        assert_eq!(
            guarded().decide("initech---my-app.example.dev", "/settings?tab=billing&x=1"),
            rewrite("initech", "/initech/settings?tab=billing&x=1")
        );
    }

    #[test]
    fn port_and_case_are_ignored() {
        assert_eq!(
            guarded().decide("ACME---My-App.Example.DEV:443", "/"),
            rewrite("acme", "/acme/")
        );
    }

    #[test]
    fn splits_on_first_delimiter() {
        assert_eq!(
            unguarded().decide("acme---feature---x.example.dev", "/"),
            rewrite("acme", "/acme/")
        );
    }

    #[test]
    fn empty_candidate_passes_through() {
        for rule in [guarded(), unguarded()] {
            assert_eq!(
                rule.decide("---my-app.example.dev", "/"),
                pass(PassThroughReason::EmptyTenant)
            );
        }
    }

    #[test]
    fn malformed_hosts_pass_through() {
        for host in ["", "   ", "127.0.0.1:3000", "[::1]:3000", "acme---x..example.dev"] {
            assert_eq!(
                unguarded().decide(host, "/"),
                pass(PassThroughReason::NoSubdomain),
                "host {host:?}"
            );
        }
    }

    #[test]
    fn preview_hosts_on_private_suffixes() {
        assert_eq!(
            guarded().decide("acme---my-app-git-feature.vercel.app", "/dashboard"),
            rewrite("acme", "/acme/dashboard")
        );

        let strict = RewriteRule::new(
            RewritePolicy::AllowList,
            true,
            true,
            Arc::new(TenantDirectory::from_config(&TenantConfig::defaults())),
        );
        assert_eq!(
            strict.decide("acme---my-app-git-feature.vercel.app", "/dashboard"),
            pass(PassThroughReason::NoSubdomain)
        );
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(rewrite("acme", "/acme").outcome(), "rewritten");
        assert_eq!(pass(PassThroughReason::UnknownTenant).outcome(), "unknown_tenant");
    }
}
