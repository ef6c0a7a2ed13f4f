use anyhow::Result;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::commands::HistoryConfig;

/// Main configuration structure for docflow
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DocflowConfig {
    /// Command history settings
    #[serde(default)]
    pub history: HistoryConfig,
    /// Lifecycle policy
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Refuse edits, undo and redo while a document is in review
    #[serde(default)]
    pub lock_content_in_review: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON structured logs instead of plain text
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl DocflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (docflow.toml)
    /// 3. Environment variables (DOCFLOW_SECTION__KEY, e.g.
    ///    DOCFLOW_HISTORY__MAX_DEPTH=100)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("docflow.toml").exists() {
            builder = builder.add_source(File::with_name("docflow"));
        }

        builder = builder.add_source(
            Environment::with_prefix("DOCFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse a TOML document, falling back to defaults for missing keys
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<DocflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = DocflowConfig::load_env_file();
        DocflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static DocflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocflowConfig::default();
        assert_eq!(config.history.max_depth, None);
        assert!(!config.workflow.lock_content_in_review);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DocflowConfig::from_toml_str(
            r#"
            [history]
            max_depth = 25

            [workflow]
            lock_content_in_review = true
            "#,
        )
        .unwrap();

        assert_eq!(config.history.max_depth, Some(25));
        assert!(config.workflow.lock_content_in_review);
        assert_eq!(config.observability, ObservabilityConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = DocflowConfig::from_toml_str("").unwrap();
        assert_eq!(config, DocflowConfig::default());
    }

    #[test]
    fn test_toml_serialization_round_trip() {
        let mut config = DocflowConfig::default();
        config.history.max_depth = Some(10);
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(DocflowConfig::from_toml_str(&text).unwrap(), config);
    }
}
