//! Configuration management for the analytics engine
//!
//! This module provides configuration file support with TOML format,
//! environment variable overrides, and sensible defaults. The dataset root
//! can always be overridden with the `DATASET_DIR` environment variable,
//! matching the deployment convention of the surrounding platform.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::DatasetKind;

/// Environment variable overriding the dataset root directory
pub const DATASET_DIR_ENV: &str = "DATASET_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Dataset directory layout
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Cache TTL tiers
    #[serde(default)]
    pub cache: CacheConfig,

    /// Scan worker-pool tuning
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Dataset directory layout
///
/// The root holds one subdirectory per record category; each subdirectory
/// holds delimited files processed in ascending filename order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// Root dataset directory
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Enrollment category subdirectory name
    #[serde(default = "default_enrollment_dir")]
    pub enrollment_dir: String,

    /// Demographic category subdirectory name
    #[serde(default = "default_demographic_dir")]
    pub demographic_dir: String,

    /// Biometric category subdirectory name
    #[serde(default = "default_biometric_dir")]
    pub biometric_dir: String,
}

/// Cache TTL tiers
///
/// Callers pick the tier; the cache store itself is TTL-agnostic.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Short tier for volatile aggregates, in seconds
    #[serde(default = "default_ttl_short_secs")]
    pub ttl_short_secs: u64,

    /// Long tier for expensive full-dataset scans, in seconds
    #[serde(default = "default_ttl_long_secs")]
    pub ttl_long_secs: u64,
}

/// Scan worker-pool tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Maximum number of scans running concurrently on blocking workers
    #[serde(default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,
}

// Default value functions
fn default_root() -> PathBuf {
    match std::env::var_os(DATASET_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from("dataset").join("clean"),
    }
}
fn default_enrollment_dir() -> String {
    "api_data_aadhar_enrolment".to_string()
}
fn default_demographic_dir() -> String {
    "api_data_aadhar_demographic".to_string()
}
fn default_biometric_dir() -> String {
    "api_data_aadhar_biometric".to_string()
}
fn default_ttl_short_secs() -> u64 {
    300
}
fn default_ttl_long_secs() -> u64 {
    1800
}
fn default_max_concurrent_scans() -> usize {
    num_cpus::get().max(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            cache: CacheConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            enrollment_dir: default_enrollment_dir(),
            demographic_dir: default_demographic_dir(),
            biometric_dir: default_biometric_dir(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_short_secs: default_ttl_short_secs(),
            ttl_long_secs: default_ttl_long_secs(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scans: default_max_concurrent_scans(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// any omitted field. The `DATASET_DIR` environment variable still wins
    /// for the dataset root when the file does not set one.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scan.max_concurrent_scans == 0 {
            return Err(Error::Configuration(
                "scan.max_concurrent_scans must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl DatasetConfig {
    /// Directory holding a category's delimited files
    pub fn category_dir(&self, kind: DatasetKind) -> PathBuf {
        let sub = match kind {
            DatasetKind::Enrollment => &self.enrollment_dir,
            DatasetKind::Demographic => &self.demographic_dir,
            DatasetKind::Biometric => &self.biometric_dir,
        };
        self.root.join(sub)
    }
}

impl CacheConfig {
    /// Short TTL tier as a `Duration`
    pub fn ttl_short(&self) -> Duration {
        Duration::from_secs(self.ttl_short_secs)
    }

    /// Long TTL tier as a `Duration`
    pub fn ttl_long(&self) -> Duration {
        Duration::from_secs(self.ttl_long_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_short_secs, 300);
        assert_eq!(config.cache.ttl_long_secs, 1800);
        assert!(config.scan.max_concurrent_scans >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_category_dirs() {
        let dataset = DatasetConfig {
            root: PathBuf::from("/data/clean"),
            ..DatasetConfig::default()
        };
        assert_eq!(
            dataset.category_dir(DatasetKind::Enrollment),
            PathBuf::from("/data/clean/api_data_aadhar_enrolment")
        );
        assert_eq!(
            dataset.category_dir(DatasetKind::Biometric),
            PathBuf::from("/data/clean/api_data_aadhar_biometric")
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl_long_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl_long_secs, 60);
        assert_eq!(config.cache.ttl_short_secs, 300);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config: Config = toml::from_str(
            r#"
            [scan]
            max_concurrent_scans = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
