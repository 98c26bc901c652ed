//! Configuration management for claude-meta.
//!
//! Handles:
//! - Analysis thresholds (sequences, churn, idle periods, context windows)
//! - Prompt scoring defaults
//! - Output and parser preferences

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MetaError, Result};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tool-sequence mining.
    #[serde(default)]
    pub sequences: SequencesConfig,
    /// File churn detection.
    #[serde(default)]
    pub churn: ChurnConfig,
    /// Idle period detection.
    #[serde(default)]
    pub idle: IdleConfig,
    /// Error context windows.
    #[serde(default)]
    pub context: ContextConfig,
    /// Prompt scoring.
    #[serde(default)]
    pub prompts: PromptsConfig,
    /// Output preferences.
    #[serde(default)]
    pub output: OutputConfig,
    /// Session loading.
    #[serde(default)]
    pub parser: ParserConfig,
}

/// Project-specific configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = ".claude-meta.toml";

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration with project-specific overrides.
    ///
    /// Searches for `.claude-meta.toml` in the given project directory
    /// and merges it over the global configuration.
    pub fn load_for_project(project_dir: &Path) -> Result<Self> {
        let mut config = Self::load().unwrap_or_default();

        let project_config_path = project_dir.join(PROJECT_CONFIG_FILENAME);
        if project_config_path.exists() {
            let project_config = Self::load_from(&project_config_path)?;
            config.merge_from(&project_config);
        }

        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MetaError::io(format!("Failed to read config file: {}", path.display()), e))?;

        let config = toml::from_str(&content).map_err(|e| MetaError::InvalidConfig {
            message: format!("{}: {e}", path.display()),
        })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Explicit file if given, else global plus project overrides.
    pub fn resolve(explicit: Option<&Path>, project_dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Self::load_for_project(project_dir),
        }
    }

    /// Merge another config into this one (other takes precedence where it
    /// differs from the default).
    pub fn merge_from(&mut self, other: &Config) {
        let defaults = Config::default();

        if other.sequences.min_length != defaults.sequences.min_length {
            self.sequences.min_length = other.sequences.min_length;
        }
        if other.sequences.min_occurrences != defaults.sequences.min_occurrences {
            self.sequences.min_occurrences = other.sequences.min_occurrences;
        }
        self.sequences.include_builtin = other.sequences.include_builtin;

        if other.churn.threshold != defaults.churn.threshold {
            self.churn.threshold = other.churn.threshold;
        }
        if other.idle.threshold_minutes != defaults.idle.threshold_minutes {
            self.idle.threshold_minutes = other.idle.threshold_minutes;
        }
        if other.context.window != defaults.context.window {
            self.context.window = other.context.window;
        }

        if other.prompts.min_quality != defaults.prompts.min_quality {
            self.prompts.min_quality = other.prompts.min_quality;
        }
        if other.prompts.limit != defaults.prompts.limit {
            self.prompts.limit = other.prompts.limit;
        }

        self.output.pretty = other.output.pretty;
        if other.output.limit != defaults.output.limit {
            self.output.limit = other.output.limit;
        }

        self.parser.lenient = other.parser.lenient;
        if other.parser.max_file_size != defaults.parser.max_file_size {
            self.parser.max_file_size = other.parser.max_file_size;
        }
    }
}

/// Tool-sequence mining configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencesConfig {
    /// Shortest sequence mined.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Occurrences needed to report a sequence.
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,
    /// Count built-in tools.
    #[serde(default = "default_true")]
    pub include_builtin: bool,
}

impl Default for SequencesConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            min_occurrences: default_min_occurrences(),
            include_builtin: true,
        }
    }
}

/// File churn configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// Accesses needed to report a file.
    #[serde(default = "default_churn_threshold")]
    pub threshold: usize,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            threshold: default_churn_threshold(),
        }
    }
}

/// Idle period configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleConfig {
    /// Gap between turns, in minutes, that counts as idle.
    #[serde(default = "default_idle_minutes")]
    pub threshold_minutes: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold_minutes: default_idle_minutes(),
        }
    }
}

/// Error context configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Turns shown on each side of an error.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

/// Prompt scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Lowest score reported.
    #[serde(default = "default_min_quality")]
    pub min_quality: f64,
    /// Prompts reported.
    #[serde(default = "default_prompt_limit")]
    pub limit: usize,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            min_quality: default_min_quality(),
            limit: default_prompt_limit(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON.
    #[serde(default)]
    pub pretty: bool,
    /// Default result limit (0 = unlimited).
    #[serde(default)]
    pub limit: usize,
}

/// Session loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Skip malformed lines instead of failing.
    #[serde(default = "default_true")]
    pub lenient: bool,
    /// Largest transcript accepted, in bytes (0 = unlimited).
    #[serde(default)]
    pub max_file_size: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            lenient: true,
            max_file_size: 0,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_min_length() -> usize {
    crate::analytics::sequences::MIN_SEQUENCE_LENGTH
}

fn default_min_occurrences() -> usize {
    crate::analytics::MIN_PATTERN_OCCURRENCES
}

fn default_churn_threshold() -> usize {
    5
}

fn default_idle_minutes() -> u64 {
    5
}

fn default_window() -> usize {
    3
}

fn default_min_quality() -> f64 {
    crate::query::prompts::DEFAULT_MIN_QUALITY
}

fn default_prompt_limit() -> usize {
    crate::query::prompts::DEFAULT_PROMPT_LIMIT
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| MetaError::Unsupported {
        feature: "config directory discovery".to_string(),
    })?;

    Ok(config_dir.join("claude-meta").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sequences.min_length, 2);
        assert_eq!(config.sequences.min_occurrences, 3);
        assert!(config.sequences.include_builtin);
        assert_eq!(config.churn.threshold, 5);
        assert_eq!(config.idle.threshold_minutes, 5);
        assert_eq!(config.context.window, 3);
        assert_eq!(config.prompts.min_quality, 0.8);
        assert_eq!(config.prompts.limit, 10);
        assert!(!config.output.pretty);
        assert!(config.parser.lenient);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str("[churn]\nthreshold = 8\n").unwrap();
        assert_eq!(parsed.churn.threshold, 8);
        assert_eq!(parsed.idle, IdleConfig::default());
        assert_eq!(parsed.sequences, SequencesConfig::default());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.context.window = 7;
        let mut override_config = Config::default();
        override_config.churn.threshold = 10;
        override_config.prompts.min_quality = 0.5;
        override_config.output.pretty = true;

        base.merge_from(&override_config);

        assert_eq!(base.churn.threshold, 10);
        assert_eq!(base.prompts.min_quality, 0.5);
        assert!(base.output.pretty);
        assert_eq!(base.context.window, 7);
    }

    #[test]
    fn test_load_for_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_config = r#"
[idle]
threshold_minutes = 15

[sequences]
include_builtin = false
"#;
        std::fs::write(temp_dir.path().join(PROJECT_CONFIG_FILENAME), project_config).unwrap();

        let config = Config::load_for_project(temp_dir.path()).unwrap();

        assert_eq!(config.idle.threshold_minutes, 15);
        assert!(!config.sequences.include_builtin);
        assert_eq!(config.sequences.min_length, 2);
    }

    #[test]
    fn test_load_from_malformed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[churn\nthreshold = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, MetaError::InvalidConfig { .. }));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(&path, "[context]\nwindow = 1\n").unwrap();

        let config = Config::resolve(Some(&path), temp_dir.path()).unwrap();
        assert_eq!(config.context.window, 1);

        let missing = Config::resolve(Some(&temp_dir.path().join("nope.toml")), temp_dir.path());
        assert!(missing.is_err());
    }
}
