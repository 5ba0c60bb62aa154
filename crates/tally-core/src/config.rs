//! Categorizer configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/tally/config/categorizer.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Override files may be partial; any key they omit keeps its default value.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/categorizer.toml");

/// Hard upper bound imposed by the remote classifier
pub const MAX_BATCH_SIZE: usize = 100;

/// Remote classifier settings
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub timeout: Duration,
    pub batch_size: usize,
    pub api_key_header: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            batch_size: MAX_BATCH_SIZE,
            api_key_header: "X-API-Key".to_string(),
        }
    }
}

/// How rule engine results are discounted when used as a fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackConfig {
    pub rule_penalty: f64,
    pub rule_floor: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            rule_penalty: 0.2,
            rule_floor: 0.3,
        }
    }
}

/// Confidence tier thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierConfig {
    pub high: f64,
    pub medium: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            high: 0.90,
            medium: 0.70,
        }
    }
}

/// Complete categorizer configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizerConfig {
    pub remote: RemoteConfig,
    pub fallback: FallbackConfig,
    pub tiers: TierConfig,
}

impl CategorizerConfig {
    /// Load from the default override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit override path
    ///
    /// A missing file is not an error; the embedded defaults apply.
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Parse a TOML document on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// The embedded default document
    pub fn default_toml() -> &'static str {
        DEFAULT_CONFIG
    }

    fn validate(&self) -> Result<()> {
        if self.remote.batch_size == 0 || self.remote.batch_size > MAX_BATCH_SIZE {
            return Err(Error::Config(format!(
                "remote.batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.remote.batch_size
            )));
        }
        if self.remote.timeout.is_zero() {
            return Err(Error::Config("remote.timeout_secs must be positive".into()));
        }
        if self.remote.api_key_header.trim().is_empty() {
            return Err(Error::Config("remote.api_key_header must not be empty".into()));
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&self.fallback.rule_penalty) || !unit.contains(&self.fallback.rule_floor) {
            return Err(Error::Config(
                "fallback.rule_penalty and fallback.rule_floor must be within [0, 1]".into(),
            ));
        }
        if !unit.contains(&self.tiers.high)
            || !unit.contains(&self.tiers.medium)
            || self.tiers.medium > self.tiers.high
        {
            return Err(Error::Config(format!(
                "tiers must satisfy 0 <= medium <= high <= 1, got medium={} high={}",
                self.tiers.medium, self.tiers.high
            )));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("categorizer.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<CategorizerConfig> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading categorizer config override");
            fs::read_to_string(&path)?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    remote: Option<RawRemote>,
    fallback: Option<RawFallback>,
    tiers: Option<RawTiers>,
}

#[derive(Debug, Deserialize)]
struct RawRemote {
    timeout_secs: Option<u64>,
    batch_size: Option<usize>,
    api_key_header: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFallback {
    rule_penalty: Option<f64>,
    rule_floor: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTiers {
    high: Option<f64>,
    medium: Option<f64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<CategorizerConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let mut config = CategorizerConfig::default();

    if let Some(remote) = raw.remote {
        if let Some(timeout) = remote.timeout_secs {
            config.remote.timeout = Duration::from_secs(timeout);
        }
        if let Some(batch_size) = remote.batch_size {
            config.remote.batch_size = batch_size;
        }
        if let Some(header) = remote.api_key_header {
            config.remote.api_key_header = header;
        }
    }

    if let Some(fallback) = raw.fallback {
        if let Some(penalty) = fallback.rule_penalty {
            config.fallback.rule_penalty = penalty;
        }
        if let Some(floor) = fallback.rule_floor {
            config.fallback.rule_floor = floor;
        }
    }

    if let Some(tiers) = raw.tiers {
        if let Some(high) = tiers.high {
            config.tiers.high = high;
        }
        if let Some(medium) = tiers.medium {
            config.tiers.medium = medium;
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, CategorizerConfig::default());
        assert_eq!(config.remote.timeout, Duration::from_secs(30));
        assert_eq!(config.remote.batch_size, 100);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = parse_config("[tiers]\nhigh = 0.95\n").unwrap();
        assert_eq!(config.tiers.high, 0.95);
        assert_eq!(config.tiers.medium, 0.70);
        assert_eq!(config.remote.api_key_header, "X-API-Key");
    }

    #[test]
    fn test_rejects_oversized_batch() {
        let err = parse_config("[remote]\nbatch_size = 250\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_inverted_tiers() {
        let err = parse_config("[tiers]\nhigh = 0.5\nmedium = 0.8\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = parse_config("[remote\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_load_from_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorizer.toml");
        std::fs::write(&path, "[remote]\ntimeout_secs = 5\n").unwrap();

        let config = CategorizerConfig::load_from(&path).unwrap();
        assert_eq!(config.remote.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CategorizerConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CategorizerConfig::default());
    }

    #[test]
    fn test_load_from_unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CategorizerConfig::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
