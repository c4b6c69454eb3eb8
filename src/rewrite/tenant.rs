//! Tenant directory: the allow-list and the display metadata for each tenant.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::TenantConfig;
use crate::rewrite::TENANT_DELIMITER;

/// A tenant as exposed to the rest of the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub accent: String,
}

impl Tenant {
    /// Host pattern under which previews for this tenant are reachable.
    pub fn preview_host_pattern(&self) -> String {
        format!("{}{}*", self.id, TENANT_DELIMITER)
    }
}

impl From<&TenantConfig> for Tenant {
    fn from(config: &TenantConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            accent: config.accent.clone(),
        }
    }
}

/// Immutable set of known tenants, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct TenantDirectory {
    tenants: Vec<Tenant>,
    index: HashMap<String, usize>,
}

impl TenantDirectory {
    /// Build the directory. Later duplicates of an id are ignored.
    pub fn from_config(configs: &[TenantConfig]) -> Self {
        let mut directory = Self::default();
        for config in configs {
            if directory.index.contains_key(&config.id) {
                continue;
            }
            directory
                .index
                .insert(config.id.clone(), directory.tenants.len());
            directory.tenants.push(Tenant::from(config));
        }
        directory
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Tenant> {
        self.index.get(id).map(|&i| &self.tenants[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tenant> {
        self.tenants.iter()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tenants_are_known() {
        let directory = TenantDirectory::from_config(&TenantConfig::defaults());

        for id in ["acme", "globex", "initech", "all"] {
            assert!(directory.contains(id), "{id} should be known");
        }
        assert!(!directory.contains("unknown"));
        assert_eq!(directory.get("acme").map(|t| t.name.as_str()), Some("Acme Corp"));
    }

    #[test]
    fn keeps_configuration_order_and_first_duplicate() {
        let mut configs = TenantConfig::defaults();
        configs.push(TenantConfig {
            id: "acme".into(),
            name: "Shadow".into(),
            accent: "red".into(),
        });
        let directory = TenantDirectory::from_config(&configs);

        assert_eq!(directory.len(), 4);
        let ids: Vec<_> = directory.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["acme", "globex", "initech", "all"]);
        assert_eq!(directory.get("acme").map(|t| t.name.as_str()), Some("Acme Corp"));
    }

    #[test]
    fn preview_host_pattern() {
        let directory = TenantDirectory::from_config(&TenantConfig::defaults());
        let globex = directory.get("globex").unwrap();
        assert_eq!(globex.preview_host_pattern(), "globex---*");
    }
}
