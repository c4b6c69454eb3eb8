//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → scope.rs (is the path excluded from rewriting?)
//!     → matcher.rs (evaluate prefix conditions)
//!     → Return: in scope → rewrite rule, excluded → forward as-is
//!
//! Scope Compilation (at startup and on reload):
//!     rewrite.exclude_paths
//!     → Compile prefix matchers
//!     → Freeze as immutable RewriteScope
//! ```
//!
//! # Design Decisions
//! - Compiled once per config, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always gets the same answer

pub mod matcher;
pub mod scope;

pub use scope::RewriteScope;
