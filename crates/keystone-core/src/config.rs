//! Runtime capacities, loadable from TOML
//!
//! A config file looks like:
//!
//! ```toml
//! max_component_types = 512
//! max_system_types = 32
//! initial_entity_capacity = 10000
//! ```
//!
//! Missing keys fall back to [`EcsConfig::default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Errors that can occur while loading or saving an [`EcsConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Capacities an entity manager is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Maximum number of distinct component types (signature width in bits)
    pub max_component_types: usize,
    /// Maximum number of systems
    pub max_system_types: usize,
    /// Entity slots to reserve up front; zero reserves nothing
    pub initial_entity_capacity: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_component_types: 512,
            max_system_types: 32,
            initial_entity_capacity: 0,
        }
    }
}

impl EcsConfig {
    /// Create a config with the given capacities and no initial reservation
    pub fn new(max_component_types: usize, max_system_types: usize) -> Self {
        Self {
            max_component_types,
            max_system_types,
            initial_entity_capacity: 0,
        }
    }

    /// Builder-style setter for the initial entity reservation
    pub fn with_initial_entity_capacity(mut self, count: usize) -> Self {
        self.initial_entity_capacity = count;
        self
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(PathBuf::from("<string>"), e))
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        info!(
            "Loaded ECS config from {:?} ({} component types, {} systems)",
            path, config.max_component_types, config.max_system_types
        );
        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the config to disk, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| ConfigError::Io(dir.to_path_buf(), e))?;
            }
        }
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!("Saved ECS config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_capacities() {
        let config = EcsConfig::default();
        assert_eq!(config.max_component_types, 512);
        assert_eq!(config.max_system_types, 32);
        assert_eq!(config.initial_entity_capacity, 0);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = EcsConfig::from_toml_str("max_system_types = 4\n").unwrap();
        assert_eq!(config.max_system_types, 4);
        assert_eq!(config.max_component_types, 512);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = EcsConfig::from_toml_str("max_system_types = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_, _)));
    }

    #[test]
    fn save_and_load() {
        let dir = std::env::temp_dir().join(format!("keystone-config-{}", std::process::id()));
        let path = dir.join("ecs.toml");
        let config = EcsConfig::new(16, 4).with_initial_entity_capacity(100);
        config.save(&path).unwrap();

        let loaded = EcsConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EcsConfig::load("/definitely/not/here/ecs.toml").unwrap_err();
        match err {
            ConfigError::Io(path, _) => assert!(path.ends_with("ecs.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
