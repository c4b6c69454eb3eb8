//! Which requests the rewrite rule sees.
//!
//! API routes, framework static assets and the favicon are forwarded as-is
//! without ever consulting the rule.

use axum::body::Body;
use axum::http::Request;

use crate::config::RewriteConfig;
use crate::routing::matcher::{AnyMatcher, Matcher, NotMatcher, PathPrefixMatcher};

/// Compiled path filter. Immutable after construction.
#[derive(Debug)]
pub struct RewriteScope {
    matcher: NotMatcher,
    excluded: Vec<PathPrefixMatcher>,
}

impl RewriteScope {
    pub fn new<I, S>(exclude_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let excluded: Vec<PathPrefixMatcher> =
            exclude_paths.into_iter().map(PathPrefixMatcher::new).collect();
        let matchers = excluded
            .iter()
            .cloned()
            .map(|m| Box::new(m) as Box<dyn Matcher>)
            .collect();

        Self {
            matcher: NotMatcher::new(Box::new(AnyMatcher::new(matchers))),
            excluded,
        }
    }

    pub fn from_config(config: &RewriteConfig) -> Self {
        Self::new(config.exclude_paths.iter().cloned())
    }

    /// True if the request should be handed to the rewrite rule.
    pub fn includes(&self, req: &Request<Body>) -> bool {
        self.matcher.matches(req)
    }

    /// Same check on a bare path, for dry runs.
    pub fn includes_path(&self, path: &str) -> bool {
        !self.excluded.iter().any(|m| m.matches_path(path))
    }
}
