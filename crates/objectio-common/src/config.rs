//! Ambient configuration for the placement/erasure/registry core.
//!
//! This is the structure an external CLI collaborator deserializes from
//! TOML and hands to `Service::bootstrap`; loading the file and merging
//! CLI overrides is that collaborator's job (see `bin/objectio-node` for
//! a minimal example), not this crate's.

use crate::types::{DeploymentId, ErasureConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the storage core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            storage: StorageConfig::default(),
            registry: RegistryConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Node identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_name")]
    pub name: String,
    #[serde(default)]
    pub deployment_id: Option<[u8; 16]>,
}

impl NodeConfig {
    /// The configured deployment id, or a freshly generated one if the
    /// config file does not yet pin one (first-boot bootstrap).
    #[must_use]
    pub fn deployment_id(&self) -> DeploymentId {
        self.deployment_id
            .map(DeploymentId::from_bytes)
            .unwrap_or_else(DeploymentId::generate)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            deployment_id: None,
        }
    }
}

fn default_node_name() -> String {
    "objectio-node".to_string()
}

/// Storage roots and default erasure sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_disk_roots")]
    pub disk_roots: Vec<PathBuf>,
    #[serde(default)]
    pub erasure: ErasureConfigToml,
    #[serde(default = "default_inline_threshold")]
    pub inline_threshold: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            disk_roots: default_disk_roots(),
            erasure: ErasureConfigToml::default(),
            inline_threshold: default_inline_threshold(),
        }
    }
}

fn default_disk_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/var/lib/objectio/data")]
}

fn default_inline_threshold() -> u64 {
    128 * 1024
}

/// `ErasureConfig` mirrored as plain fields so it round-trips through
/// TOML without a custom (de)serializer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErasureConfigToml {
    pub k: u8,
    pub m: u8,
}

impl Default for ErasureConfigToml {
    fn default() -> Self {
        Self { k: 4, m: 2 }
    }
}

impl TryFrom<ErasureConfigToml> for ErasureConfig {
    type Error = crate::types::ErasureConfigError;

    fn try_from(value: ErasureConfigToml) -> Result<Self, Self::Error> {
        Self::new(value.k, value.m)
    }
}

/// Location registry cache sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    10_000
}

fn default_ttl_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.inline_threshold, 128 * 1024);
        assert_eq!(config.registry.max_entries, 10_000);
        assert_eq!(config.registry.ttl_secs, 60);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn erasure_config_toml_converts_to_domain_type() {
        let toml = ErasureConfigToml { k: 8, m: 4 };
        let domain: ErasureConfig = toml.try_into().unwrap();
        assert_eq!(domain.k, 8);
        assert_eq!(domain.m, 4);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("deserialize");
        assert_eq!(parsed.log_level, config.log_level);
    }
}
