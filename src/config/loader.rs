//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RewritePolicy;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.rewrite.policy, RewritePolicy::AllowList);
        assert!(config.rewrite.skip_prefixed);
        assert_eq!(config.tenants.len(), 4);
    }

    #[test]
    fn parses_full_file() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [upstream]
            address = "app.internal:3000"

            [rewrite]
            policy = "unconditional"
            skip_prefixed = false
            segment_prefix_match = true
            include_private_domains = true
            exclude_paths = ["/api"]

            [[tenants]]
            id = "hooli"
            name = "Hooli"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.address, "app.internal:3000");
        assert_eq!(config.rewrite.policy, RewritePolicy::Unconditional);
        assert!(!config.rewrite.skip_prefixed);
        assert!(config.rewrite.segment_prefix_match);
        assert!(config.rewrite.include_private_domains);
        assert_eq!(config.rewrite.exclude_paths, vec!["/api".to_string()]);
        assert_eq!(config.tenants.len(), 1);
        assert_eq!(config.tenants[0].accent, "neutral");
    }

    #[test]
    fn reports_validation_failures() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("request_secs"));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = parse_config("[rewrite]\npolicy = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
