//! Engine configuration loaded from TOML
//!
//! ```toml
//! [storage]
//! data_dir = "./data/welllog.db"
//! raw_dir = "./data/raw"
//!
//! [ingest]
//! row_batch_size = 500
//!
//! [aggregation]
//! batch_width = 5
//! curve_timeout_secs = 10
//!
//! [context]
//! ttl_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

/// Environment variable pointing at a config file
pub const CONFIG_ENV_VAR: &str = "WELLLOG_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "welllog.toml";

/// Top-level engine configuration.
///
/// Loaded in order:
/// 1. `$WELLLOG_CONFIG` env var
/// 2. `./welllog.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub interpretation: InterpretationConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order.
    ///
    /// Never fails: an unreadable or invalid file is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {}, falling back",
                            CONFIG_ENV_VAR
                        );
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject values that would stall or disable a subsystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.ingest.row_batch_size == 0 {
            errors.push("ingest.row_batch_size must be > 0".to_string());
        }
        if self.ingest.max_file_bytes == 0 {
            errors.push("ingest.max_file_bytes must be > 0".to_string());
        }
        if self.aggregation.batch_width == 0 {
            errors.push("aggregation.batch_width must be > 0".to_string());
        }
        if self.aggregation.curve_timeout_secs == 0 {
            errors.push("aggregation.curve_timeout_secs must be > 0".to_string());
        }
        if self.context.ttl_secs == 0 {
            errors.push("context.ttl_secs must be > 0".to_string());
        }
        if self.interpretation.max_sample_rows == 0 {
            errors.push("interpretation.max_sample_rows must be > 0".to_string());
        }
        if self.chat.history_limit == 0 {
            errors.push("chat.history_limit must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root directory for raw uploaded files
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(defaults::DATA_DIR)
}
fn default_raw_dir() -> PathBuf {
    PathBuf::from(defaults::RAW_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            raw_dir: default_raw_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_row_batch_size")]
    pub row_batch_size: usize,

    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

const fn default_row_batch_size() -> usize {
    defaults::ROW_BATCH_SIZE
}
const fn default_max_file_bytes() -> usize {
    defaults::MAX_FILE_BYTES
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            row_batch_size: default_row_batch_size(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Curves evaluated concurrently per batch
    #[serde(default = "default_batch_width")]
    pub batch_width: usize,

    /// Per-curve timeout; a curve exceeding it is omitted from the result
    #[serde(default = "default_curve_timeout_secs")]
    pub curve_timeout_secs: u64,
}

const fn default_batch_width() -> usize {
    defaults::AGGREGATION_BATCH_WIDTH
}
const fn default_curve_timeout_secs() -> u64 {
    defaults::CURVE_STATS_TIMEOUT_SECS
}

impl AggregationConfig {
    pub const fn curve_timeout(&self) -> Duration {
        Duration::from_secs(self.curve_timeout_secs)
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            batch_width: default_batch_width(),
            curve_timeout_secs: default_curve_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

const fn default_ttl_secs() -> u64 {
    defaults::CONTEXT_TTL_SECS
}
const fn default_sample_rows() -> usize {
    defaults::CONTEXT_SAMPLE_ROWS
}

impl ContextConfig {
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sample_rows: default_sample_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationConfig {
    #[serde(default = "default_max_sample_rows")]
    pub max_sample_rows: usize,
}

const fn default_max_sample_rows() -> usize {
    defaults::INTERPRETATION_MAX_SAMPLE_ROWS
}

impl Default for InterpretationConfig {
    fn default() -> Self {
        Self {
            max_sample_rows: default_max_sample_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_prompt_history")]
    pub prompt_history: usize,

    #[serde(default = "default_digest_curves")]
    pub digest_curves: usize,

    #[serde(default = "default_summary_curves")]
    pub summary_curves: usize,
}

const fn default_history_limit() -> usize {
    defaults::CHAT_HISTORY_LIMIT
}
const fn default_prompt_history() -> usize {
    defaults::CHAT_PROMPT_HISTORY
}
const fn default_digest_curves() -> usize {
    defaults::DIGEST_CURVES
}
const fn default_summary_curves() -> usize {
    defaults::SUMMARY_CURVES
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            prompt_history: default_prompt_history(),
            digest_curves: default_digest_curves(),
            summary_curves: default_summary_curves(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingest.row_batch_size, 500);
        assert_eq!(config.aggregation.batch_width, 5);
        assert_eq!(config.context.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welllog.toml");
        std::fs::write(&path, "[aggregation]\nbatch_width = 2\n").unwrap();

        let config = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.aggregation.batch_width, 2);
        assert_eq!(config.aggregation.curve_timeout_secs, 10);
        assert_eq!(config.ingest.row_batch_size, 500);
    }

    #[test]
    fn test_zero_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welllog.toml");
        std::fs::write(&path, "[ingest]\nrow_batch_size = 0\n[context]\nttl_secs = 0\n").unwrap();

        match EngineConfig::load_from_file(&path) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
