//! Administrative operations: clear, stats, optimize, health
//!
//! These are the only interfaces the surrounding API layer needs from this
//! core besides the read operations. Cache and index are cleared together:
//! both are derived, rebuildable state, and clearing one but not the other
//! would let a stale index outlive the results it was built alongside.

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheStatsSnapshot;
use crate::engine::AnalyticsEngine;
use crate::scan;
use crate::types::DatasetKind;

/// Outcome of a cache-and-index wipe
#[derive(Debug, Clone, Serialize)]
pub struct ClearReport {
    /// Fixed status label
    pub status: &'static str,
    /// Cache entries dropped
    pub entries_removed: usize,
    /// Indexed states dropped
    pub states_removed: usize,
}

/// Cache and index counters for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    /// Live cache entries
    pub active_entries: usize,
    /// Entries past their TTL but not yet evicted
    pub expired_entries: usize,
    /// Lookup hits since start or clear
    pub hits: u64,
    /// Lookup misses since start or clear
    pub misses: u64,
    /// States with indexed districts
    pub indexed_states: usize,
    /// Indexed (state, month) pairs
    pub indexed_months: usize,
    /// Short TTL tier, seconds
    pub ttl_short_secs: u64,
    /// Long TTL tier, seconds
    pub ttl_long_secs: u64,
    /// Live entries over all present entries (0.0 when the cache is empty)
    pub efficiency_ratio: f64,
}

/// Outcome of an expired-entry sweep
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeReport {
    /// Fixed status label
    pub status: &'static str,
    /// Expired cache entries evicted
    pub entries_removed: usize,
    /// Cache entries left after the sweep
    pub entries_remaining: usize,
    /// Degenerate index keys dropped
    pub index_keys_compacted: usize,
    /// States still indexed after compaction
    pub indexed_states: usize,
}

/// Overall health verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every category directory is present
    Healthy,
    /// At least one category directory is missing
    Degraded,
}

/// Per-category directory facts
#[derive(Debug, Clone, Serialize)]
pub struct DatasetHealth {
    /// Record category
    pub category: DatasetKind,
    /// Whether the directory exists
    pub available: bool,
    /// Data files found (0 when the directory is missing)
    pub file_count: usize,
    /// The directory that was checked
    pub path: String,
}

/// Full health report for the engine
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall verdict
    pub status: HealthStatus,
    /// One entry per category
    pub datasets: Vec<DatasetHealth>,
    /// In-memory cache responds to lookups
    pub cache_operational: bool,
    /// Cache counters at report time
    pub cache: CacheStatsSnapshot,
    /// States currently indexed
    pub indexed_states: usize,
}

impl AnalyticsEngine {
    /// Wipe the cache and the lookup index.
    pub fn clear_cache(&self) -> ClearReport {
        let entries_removed = self.cache.len();
        let states_removed = self.index.stats().indexed_states;
        self.cache.clear();
        self.index.clear();
        info!(entries_removed, states_removed, "Cache and index cleared");
        ClearReport {
            status: "cleared",
            entries_removed,
            states_removed,
        }
    }

    /// Cache/index counters plus the configured TTL tiers.
    pub fn cache_stats(&self) -> CacheReport {
        let cache = self.cache.stats();
        let index = self.index.stats();
        let present = cache.active + cache.expired;
        let efficiency_ratio = if present == 0 {
            0.0
        } else {
            cache.active as f64 / present as f64
        };
        CacheReport {
            active_entries: cache.active,
            expired_entries: cache.expired,
            hits: cache.hits,
            misses: cache.misses,
            indexed_states: index.indexed_states,
            indexed_months: index.indexed_months,
            ttl_short_secs: self.config.cache.ttl_short_secs,
            ttl_long_secs: self.config.cache.ttl_long_secs,
            efficiency_ratio,
        }
    }

    /// Evict expired cache entries and compact the index.
    pub fn optimize_cache(&self) -> OptimizeReport {
        let entries_removed = self.cache.optimize();
        let index_keys_compacted = self.index.compact();
        let report = OptimizeReport {
            status: "optimized",
            entries_removed,
            entries_remaining: self.cache.len(),
            index_keys_compacted,
            indexed_states: self.index.stats().indexed_states,
        };
        info!(
            entries_removed = report.entries_removed,
            entries_remaining = report.entries_remaining,
            "Cache optimized"
        );
        report
    }

    /// Check dataset directories and cache operability.
    pub fn health_check(&self) -> HealthReport {
        let datasets: Vec<DatasetHealth> = DatasetKind::ALL
            .into_iter()
            .map(|kind| {
                let dir = self.config.dataset.category_dir(kind);
                let available = dir.is_dir();
                if !available {
                    warn!(category = %kind, path = %dir.display(), "Dataset directory missing");
                }
                DatasetHealth {
                    category: kind,
                    available,
                    file_count: if available { scan::list_files(&dir).len() } else { 0 },
                    path: dir.display().to_string(),
                }
            })
            .collect();

        let status = if datasets.iter().all(|d| d.available) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        HealthReport {
            status,
            datasets,
            cache_operational: true,
            cache: self.cache.stats(),
            indexed_states: self.index.stats().indexed_states,
        }
    }
}
