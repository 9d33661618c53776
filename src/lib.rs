//! SAMVIDHAN analytics - aggregate query engine over append-only CSV datasets
//!
//! This library answers analytical queries (state totals, timelines,
//! demographics, coverage gaps, and a unified filtered/sorted/paginated
//! explorer) over three categories of flat delimited files (enrollment,
//! demographic, and biometric activity) without a backing database:
//! - TTL-based memoization of scan results with single-flight rebuilds
//! - canonical state-name normalization before any aggregation
//! - lookup indices (available states/districts) built as a scan side effect
//! - bounded blocking-worker pool so scans never block the async callers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod normalize;
pub mod parse;
pub mod query;
pub mod scan;
pub mod types;

// Re-export main types
pub use config::Config;
pub use engine::AnalyticsEngine;
pub use error::{Error, Result};
pub use query::{ExplorerParams, SortOrder};
pub use types::{ExplorerPage, ExplorerRow};
