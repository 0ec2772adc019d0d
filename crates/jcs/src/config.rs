//! Configuration file loading and parsing.
//!
//! jcs reads optional defaults from `config.toml` in the user config
//! directory (`~/.config/jcs` on Linux). Command-line flags always win;
//! the file only fills in flags left unset. Credentials are never read
//! from the file, only from flags or the environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Defaults loaded from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct JcsConfig {
    /// Base URL of the JIRA instance (e.g. "https://jira.example.com").
    pub jira_url: Option<String>,
    /// Project key to report on when `--project` is not given.
    pub project: Option<String>,
    /// Issue types treated as hierarchy roots in project mode.
    pub issue_types: Option<Vec<String>>,
    /// Report output path.
    pub output: Option<PathBuf>,
    /// Cache directory override.
    pub cache_dir: Option<PathBuf>,
}

impl JcsConfig {
    /// Load configuration from `config.toml` in the given directory.
    ///
    /// Returns an empty config (all fields `None`) if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        if !config_path.exists() {
            return Ok(JcsConfig::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config.toml")?;

        let config: JcsConfig = toml::from_str(&content).context("Failed to parse config.toml")?;

        Ok(config)
    }

    /// The per-user config directory, `~/.config/jcs` on Linux.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("jcs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let config_toml = r#"
jira_url = "https://jira.example.com"
"#;
        let config: JcsConfig = toml::from_str(config_toml).unwrap();
        assert_eq!(config.jira_url, Some("https://jira.example.com".to_string()));
        assert!(config.project.is_none());
        assert!(config.issue_types.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config_toml = r#"
jira_url = "https://jira.example.com"
project = "PROJ"
issue_types = ["Feature", "Bug"]
output = "reports/summary.html"
cache_dir = "/var/cache/jcs"
"#;
        let config: JcsConfig = toml::from_str(config_toml).unwrap();

        assert_eq!(config.project, Some("PROJ".to_string()));
        assert_eq!(
            config.issue_types,
            Some(vec!["Feature".to_string(), "Bug".to_string()])
        );
        assert_eq!(config.output, Some(PathBuf::from("reports/summary.html")));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/jcs")));
    }

    #[test]
    fn test_load_missing_config_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = JcsConfig::load(temp_dir.path()).unwrap();

        assert!(config.jira_url.is_none());
        assert!(config.project.is_none());
        assert!(config.output.is_none());
    }

    #[test]
    fn test_load_existing_config() {
        let temp_dir = TempDir::new().unwrap();

        let config_toml = r#"
project = "OPS"
issue_types = ["Initiative"]
"#;
        std::fs::write(temp_dir.path().join("config.toml"), config_toml).unwrap();

        let config = JcsConfig::load(temp_dir.path()).unwrap();
        assert_eq!(config.project, Some("OPS".to_string()));
        assert_eq!(config.issue_types, Some(vec!["Initiative".to_string()]));
    }

    #[test]
    fn test_malformed_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();

        std::fs::write(temp_dir.path().join("config.toml"), "[broken syntax").unwrap();

        let result = JcsConfig::load(temp_dir.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config.toml"));
    }

    #[test]
    fn test_default_dir_ends_with_crate_name() {
        assert!(JcsConfig::default_dir().ends_with("jcs"));
    }
}
