//! Configuration loading, validation, and management for convoctx.
//!
//! Loads configuration from `~/.convoctx/config.toml` with environment
//! variable overrides. Validates all settings at load time. Only the outer
//! orchestrator reads configuration; the processing crates take plain
//! values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.convoctx/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvoConfig {
    /// Context selection settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Citation rendering settings
    #[serde(default)]
    pub citations: CitationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Total token budget for verbatim history plus the summary reservation
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Trailing messages that are always sent verbatim
    #[serde(default = "default_always_keep_recent")]
    pub always_keep_recent: usize,

    /// Tokens reserved for the summary of older turns
    #[serde(default = "default_summary_budget")]
    pub summary_budget: usize,

    /// Characters per token for the length-based estimator
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// Fixed per-message overhead in tokens
    #[serde(default = "default_message_overhead")]
    pub message_overhead_tokens: usize,

    /// Ranker weights
    #[serde(default)]
    pub ranking: RankingConfig,
}

fn default_token_budget() -> usize {
    4096
}
fn default_always_keep_recent() -> usize {
    3
}
fn default_summary_budget() -> usize {
    500
}
fn default_chars_per_token() -> usize {
    4
}
fn default_message_overhead() -> usize {
    4
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            always_keep_recent: default_always_keep_recent(),
            summary_budget: default_summary_budget(),
            chars_per_token: default_chars_per_token(),
            message_overhead_tokens: default_message_overhead(),
            ranking: RankingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_entity_weight")]
    pub entity_weight: f64,

    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    #[serde(default = "default_question_boost")]
    pub question_boost: f64,
}

fn default_entity_weight() -> f64 {
    2.0
}
fn default_recency_weight() -> f64 {
    1.0
}
fn default_question_boost() -> f64 {
    0.5
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            entity_weight: default_entity_weight(),
            recency_weight: default_recency_weight(),
            question_boost: default_question_boost(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Badge label when a source URL has no parseable host
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
}

fn default_fallback_label() -> String {
    "Sources".into()
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            fallback_label: default_fallback_label(),
        }
    }
}

impl ConvoConfig {
    /// Load configuration from the default path (~/.convoctx/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CONVOCTX_TOKEN_BUDGET`
    /// - `CONVOCTX_KEEP_RECENT`
    /// - `CONVOCTX_SUMMARY_BUDGET`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `CONVOCTX_*` overrides read through `lookup`.
    ///
    /// Values that do not parse as unsigned integers are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut usize); 3] = [
            ("CONVOCTX_TOKEN_BUDGET", &mut self.context.token_budget),
            ("CONVOCTX_KEEP_RECENT", &mut self.context.always_keep_recent),
            ("CONVOCTX_SUMMARY_BUDGET", &mut self.context.summary_budget),
        ];
        for (key, slot) in targets {
            let Some(raw) = lookup(key) else {
                continue;
            };
            match raw.trim().parse::<usize>() {
                Ok(value) => *slot = value,
                Err(_) => tracing::warn!("Ignoring {key}={raw:?}: not an unsigned integer"),
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".convoctx")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ctx = &self.context;
        if ctx.summary_budget > ctx.token_budget {
            return Err(ConfigError::ValidationError(format!(
                "summary_budget ({}) must not exceed token_budget ({})",
                ctx.summary_budget, ctx.token_budget
            )));
        }

        if ctx.chars_per_token == 0 {
            return Err(ConfigError::ValidationError(
                "chars_per_token must be at least 1".into(),
            ));
        }

        let weights = [
            ("entity_weight", ctx.ranking.entity_weight),
            ("recency_weight", ctx.ranking.recency_weight),
            ("question_boost", ctx.ranking.question_boost),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a finite, non-negative number"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for convoctx_core::Error {
    fn from(err: ConfigError) -> Self {
        convoctx_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = ConvoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context.token_budget, 4096);
        assert_eq!(config.context.always_keep_recent, 3);
        assert_eq!(config.citations.fallback_label, "Sources");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = ConvoConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConvoConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: ConvoConfig = toml::from_str(
            r#"
[context]
token_budget = 8000

[context.ranking]
question_boost = 0.25
"#,
        )
        .unwrap();
        assert_eq!(parsed.context.token_budget, 8000);
        assert_eq!(parsed.context.summary_budget, 500);
        assert_eq!(parsed.context.ranking.question_boost, 0.25);
        assert_eq!(parsed.context.ranking.entity_weight, 2.0);
    }

    #[test]
    fn summary_budget_above_total_rejected() {
        let mut config = ConvoConfig::default();
        config.context.summary_budget = 5000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("summary_budget")
        ));
    }

    #[test]
    fn negative_weight_rejected() {
        let mut config = ConvoConfig::default();
        config.context.ranking.recency_weight = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chars_per_token_rejected() {
        let mut config = ConvoConfig::default();
        config.context.chars_per_token = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = ConvoConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(result.unwrap(), ConvoConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context]\nalways_keep_recent = 5\n\n[citations]\nfallback_label = \"Refs\"").unwrap();
        let config = ConvoConfig::load_from(file.path()).unwrap();
        assert_eq!(config.context.always_keep_recent, 5);
        assert_eq!(config.citations.fallback_label, "Refs");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context\ntoken_budget = ").unwrap();
        let err = ConvoConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_file_is_a_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context]\ntoken_budget = 100\nsummary_budget = 200").unwrap();
        let err = ConvoConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CONVOCTX_TOKEN_BUDGET", "2048"),
            ("CONVOCTX_KEEP_RECENT", "lots"),
            ("CONVOCTX_SUMMARY_BUDGET", " 128 "),
        ]);
        let mut config = ConvoConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.context.token_budget, 2048);
        assert_eq!(config.context.always_keep_recent, 3);
        assert_eq!(config.context.summary_budget, 128);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = ConvoConfig::default_toml();
        assert!(toml_str.contains("token_budget = 4096"));
        assert!(toml_str.contains("fallback_label = \"Sources\""));
    }

    #[test]
    fn config_error_converts_to_core_error() {
        let err: convoctx_core::Error = ConfigError::ValidationError("bad".into()).into();
        assert!(err.to_string().contains("bad"));
    }
}
