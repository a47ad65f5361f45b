//! Configuration management for the CLI.
//!
//! One TOML file holds the extractor settings, the provider chain and the
//! display settings:
//!
//! ```toml
//! [extractor]
//! chunk_size = 4000
//! min_confidence_requirement = 0.6
//!
//! [[providers]]
//! kind = "ollama"
//! model = "llama3.1"
//!
//! [[providers]]
//! kind = "openai"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [settings]
//! color = true
//! format = "table"
//! ```

use crate::error::{CliError, Result};
use rfp_extractor::ExtractorConfig;
use rfp_llm::{ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// LLM providers in priority order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Named extractor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// `ExtractorConfig::default()`
    Default,
    /// `ExtractorConfig::aggressive()`
    Aggressive,
    /// `ExtractorConfig::lenient()`
    Lenient,
}

impl Preset {
    /// Extractor settings for this preset
    pub fn extractor_config(self) -> ExtractorConfig {
        match self {
            Preset::Default => ExtractorConfig::default(),
            Preset::Aggressive => ExtractorConfig::aggressive(),
            Preset::Lenient => ExtractorConfig::lenient(),
        }
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".rfp").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::path()?;
                if !path.exists() {
                    debug!("No config file at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check the extractor settings.
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate().map_err(CliError::Config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            providers: vec![ProviderConfig {
                kind: ProviderKind::Ollama,
                name: None,
                endpoint: None,
                model: "llama3.1".to_string(),
                api_key: None,
                api_key_env: None,
                timeout_secs: 60,
                response: None,
            }],
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].kind, ProviderKind::Ollama);
        assert!(config.settings.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::from_toml(
            r#"
            [extractor]
            chunk_size = 6000
            min_confidence_risk = 0.35

            [[providers]]
            kind = "openai"
            name = "primary"
            model = "gpt-4o-mini"
            api_key_env = "OPENAI_API_KEY"

            [[providers]]
            kind = "ollama"
            model = "llama3.1"
            timeout_secs = 120

            [settings]
            color = false
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.extractor.chunk_size, 6_000);
        assert_eq!(config.extractor.min_confidence_risk, 0.35);
        assert_eq!(config.extractor.chunk_overlap, ExtractorConfig::default().chunk_overlap);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].display_name(), "primary");
        assert_eq!(config.providers[1].timeout_secs, 120);
        assert!(!config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_file_has_no_providers() {
        let config = Config::from_toml("").unwrap();
        assert!(config.providers.is_empty());
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_invalid_extractor_settings_rejected() {
        let result = Config::from_toml("[extractor]\nchunk_size = 100\nchunk_overlap = 100\n");
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rfp.toml");
        fs::write(&path, "[[providers]]\nkind = \"mock\"\nresponse = \"[]\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.providers[0].kind, ProviderKind::Mock);

        let missing = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(missing, Err(CliError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let parsed = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.providers[0].model, "llama3.1");
        assert_eq!(parsed.extractor.chunk_size, config.extractor.chunk_size);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::Default.extractor_config().chunk_size, ExtractorConfig::default().chunk_size);
        assert!(
            Preset::Lenient.extractor_config().min_confidence_requirement
                < Preset::Aggressive.extractor_config().min_confidence_requirement
        );
    }
}
