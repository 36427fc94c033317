//! Configuration management for Thumbsmith.
//!
//! Configuration is loaded from a TOML file with sensible defaults. All
//! sections implement `Default` and deserialize with `#[serde(default)]`,
//! so a partial config file is always valid.

use crate::error::ConfigError;
use crate::types::ThumbnailSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Thumbsmith.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fetch stage settings
    pub fetch: FetchConfig,

    /// Resize stage settings
    pub resize: ResizeConfig,

    /// Staging and output directories
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// `~/.thumbsmith/config.toml` if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "thumbsmith", "thumbsmith")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".thumbsmith").join("config.toml")
            })
    }

    /// Get the resolved staging directory path (with ~ expansion).
    pub fn input_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.storage.input_dir);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved output directory path (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.storage.output_dir);
        PathBuf::from(expanded.into_owned())
    }

    /// Check values that cannot be expressed through types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.workers == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.workers must be at least 1".to_string(),
            ));
        }
        if self.resize.widths.is_empty() {
            return Err(ConfigError::ValidationError(
                "resize.widths must list at least one target width".to_string(),
            ));
        }
        if self.resize.widths.iter().any(|w| *w == 0) {
            return Err(ConfigError::ValidationError(
                "resize.widths must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Fetch stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of concurrent fetch workers (caps I/O concurrency)
    pub workers: usize,

    /// Per-request timeout in seconds; a timeout is an ordinary fetch failure
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            timeout_secs: 30,
        }
    }
}

/// Resize stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Number of resize workers; 0 means one per available CPU
    pub workers: usize,

    /// Target widths, in production order
    pub widths: Vec<u32>,

    /// Resampling filter: nearest, triangle, catmull-rom, gaussian, lanczos3
    pub filter: String,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            widths: vec![32, 64, 200],
            filter: "lanczos3".to_string(),
        }
    }
}

impl ResizeConfig {
    /// Resolve the worker count: the configured value, or one per available
    /// CPU when set to 0 (the stage is compute-bound, unlike the fetch pool).
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// The configured widths as ordered thumbnail specs.
    pub fn specs(&self) -> Vec<ThumbnailSpec> {
        self.widths
            .iter()
            .map(|w| ThumbnailSpec { target_width: *w })
            .collect()
    }
}

/// Staging and output directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where fetched originals are staged before resizing
    pub input_dir: String,

    /// Where thumbnail variants are written
    pub output_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_dir: "~/.thumbsmith/incoming".to_string(),
            output_dir: "~/.thumbsmith/outgoing".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.workers, 4);
        assert_eq!(config.resize.widths, vec![32, 64, 200]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_workers_auto() {
        let config = ResizeConfig::default();
        assert!(config.effective_workers() >= 1);

        let pinned = ResizeConfig {
            workers: 3,
            ..ResizeConfig::default()
        };
        assert_eq!(pinned.effective_workers(), 3);
    }

    #[test]
    fn test_config_to_toml() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[fetch]"));
        assert!(toml.contains("[resize]"));
        assert!(toml.contains("[storage]"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[fetch]\nworkers = 2\n").unwrap();
        assert_eq!(config.fetch.workers, 2);
        assert_eq!(config.resize.widths, vec![32, 64, 200]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.resize.widths.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.resize.widths = vec![32, 0];
        assert!(config.validate().is_err());
    }
}
