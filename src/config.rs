//! Configuration
//!
//! Every field has a default, so an empty (or absent) config file yields
//! the standard project layout.
//!
//! ```yaml
//! pool_merge: max
//! max_depth: 64
//! render:
//!   workflows_dir: dags
//!   settings_file: airflow_settings.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::PoolMerge;
use crate::project::walker::DEFAULT_MAX_DEPTH;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,

    /// Slot combinator for pools that collide by name.
    pub pool_merge: PoolMerge,

    /// Nesting bound for dependency discovery.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            pool_merge: PoolMerge::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Artifact names, relative to the output directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub workflows_dir: PathBuf,
    pub requirements_file: PathBuf,
    pub packages_file: PathBuf,
    pub settings_file: PathBuf,
    pub env_file: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            workflows_dir: PathBuf::from("dags"),
            requirements_file: PathBuf::from("requirements.txt"),
            packages_file: PathBuf::from("packages.txt"),
            settings_file: PathBuf::from("airflow_settings.yaml"),
            env_file: PathBuf::from(".env"),
        }
    }
}

impl Config {
    /// Loads a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_yaml(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::validation("max_depth must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.render.workflows_dir, PathBuf::from("dags"));
        assert_eq!(config.render.env_file, PathBuf::from(".env"));
        assert_eq!(config.pool_merge, PoolMerge::Sum);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("pool_merge: max\nrender:\n  workflows_dir: workflows\n").unwrap();
        assert_eq!(config.pool_merge, PoolMerge::Max);
        assert_eq!(config.render.workflows_dir, PathBuf::from("workflows"));
        assert_eq!(config.render.settings_file, PathBuf::from("airflow_settings.yaml"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_zero_depth_rejected() {
        assert!(Config::from_yaml("max_depth: 0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let path = dir.path().join("dagport.yaml");
        std::fs::write(&path, "max_depth: 16\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_depth, 16);
        assert!(Config::load(dir.path().join("missing.yaml")).is_err());
    }
}
