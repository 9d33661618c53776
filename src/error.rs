//! Error types for the analytics engine
//!
//! The read path deliberately has a very small error surface: missing
//! directories yield empty scans, malformed rows are logged and skipped,
//! and cache operations are in-memory and infallible. What remains is
//! configuration loading and the scan-worker join.

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (bad TOML, unreadable file, invalid value)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error while loading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A scan worker task failed to complete (panicked or was cancelled)
    #[error("Scan worker failed: {0}")]
    ScanWorker(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
