//! Configuration for split-impl

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Naming and layout rules for a plan directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Subdirectory of the plan holding phase documents
    pub impl_dir: String,

    /// Manifest file at the plan root whose references get rewritten
    pub manifest: String,

    /// Extension of input and output documents
    pub extension: String,

    /// Logical (and file stem) name of the context document
    pub context_name: String,

    /// File stem prefix for task documents
    pub task_prefix: String,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            impl_dir: "impl".to_string(),
            manifest: "state.yaml".to_string(),
            extension: "md".to_string(),
            context_name: "context".to_string(),
            task_prefix: "task".to_string(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load config with fallback chain: explicit path, local file, user config, defaults
    pub fn load(config_path: Option<&PathBuf>) -> eyre::Result<Self> {
        use eyre::Context;

        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let candidates = [
            Some(PathBuf::from(".split-impl.yml")),
            dirs::config_dir().map(|p| p.join("split-impl").join("split-impl.yml")),
        ];

        for path in candidates.iter().flatten() {
            if path.exists() {
                match Self::load_from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> eyre::Result<Self> {
        use eyre::Context;

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Discovery directory for a plan
    pub fn impl_path(&self, plan_dir: &Path) -> PathBuf {
        plan_dir.join(&self.impl_dir)
    }

    /// Manifest location for a plan
    pub fn manifest_path(&self, plan_dir: &Path) -> PathBuf {
        plan_dir.join(&self.manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.impl_dir, "impl");
        assert_eq!(config.manifest, "state.yaml");
        assert_eq!(config.extension, "md");
        assert_eq!(config.impl_path(Path::new("plans/auth")), PathBuf::from("plans/auth/impl"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("manifest: plan.yaml\nlog-level: debug\n").unwrap();
        assert_eq!(config.manifest, "plan.yaml");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.task_prefix, "task");
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cfg.yml");
        fs::write(&path, "impl-dir: implementation\ncontext-name: overview\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.impl_dir, "implementation");
        assert_eq!(config.context_name, "overview");
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
