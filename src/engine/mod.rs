//! Aggregation engine over the three dataset categories
//!
//! The engine owns the derived, rebuildable state of the process (the
//! result cache and the lookup index) and runs every directory scan on a
//! bounded blocking-worker pool so concurrent callers never serialize on
//! each other's file I/O.
//!
//! # Read path
//!
//! ```text
//! caller ──▶ cache get(QueryKey) ──hit──▶ cached rows/summary
//!                │ miss
//!                ▼
//!         per-key flight lock ── someone else built it ──▶ re-check hit
//!                │ first in
//!                ▼
//!         scan permit ─▶ spawn_blocking fold ─▶ cache set ─▶ result
//! ```
//!
//! Only one rebuild per key runs at a time; concurrent misses on the same
//! key wait for the winner and reuse its freshly-cached result.
//!
//! # Construction
//!
//! The cache/index pair has an explicit lifecycle: build it once at process
//! start (or let [`AnalyticsEngine::new`] do it), share the engine behind an
//! `Arc`, and tear it down with the process. Nothing here is global.

pub mod admin;
pub mod aggregates;
pub mod explorer;
pub mod sampled;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::cache::{CacheStore, FlightGroup};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::IndexBuilder;
use crate::query::filter::ExplorerFilter;
use crate::types::{CoverageGap, DemographicsRow, ExplorerRow, StateCount, TimelinePoint};

use self::sampled::{AgeDistribution, CombinedDemographics, DatasetSummary, UnifiedStateMetric};

/// Structured cache key: one variant per operation, carrying every
/// normalized parameter that affects the result.
///
/// Deriving the key from normalized values means two requests that differ
/// only in spelling (`WESTBENGAL` vs `West Bengal`) share an entry, while
/// semantically different queries can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Per-state enrollment totals, truncated to `limit`
    StateDistribution {
        /// Truncation limit (part of the cached value)
        limit: usize,
    },
    /// Monthly enrollment totals, optionally filtered by state
    Timeline {
        /// Number of trailing months kept (0 = unbounded)
        months: usize,
        /// Normalized, lowercased state filter
        state: Option<String>,
    },
    /// Per-state demographic bucket totals
    Demographics {
        /// Truncation limit
        limit: usize,
    },
    /// Lowest-activity (state, district) pairs
    CoverageGaps {
        /// Truncation limit
        limit: usize,
    },
    /// Full filtered row set of the unified explorer
    Explorer(ExplorerFilter),
    /// Sampled cross-category bucket totals
    SampledCombinedDemographics,
    /// Sampled age-group pyramid
    SampledAgeDistribution,
    /// Per-category file counts and estimated record counts
    DatasetSummary,
    /// Per-state record estimates across all categories
    UnifiedStateMetrics {
        /// Truncation limit
        limit: usize,
    },
}

/// The cached value for any operation
///
/// One enum so a single [`CacheStore`] holds every result type; each
/// operation only ever reads the variant its key produces.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    /// State distribution rows
    StateDistribution(Vec<StateCount>),
    /// Timeline points
    Timeline(Vec<TimelinePoint>),
    /// Demographics rows
    Demographics(Vec<DemographicsRow>),
    /// Coverage gap rows
    CoverageGaps(Vec<CoverageGap>),
    /// Full explorer row set (shared, sorted/paginated downstream)
    ExplorerRows(Arc<Vec<ExplorerRow>>),
    /// Sampled cross-category totals
    CombinedDemographics(CombinedDemographics),
    /// Sampled age pyramid
    AgeDistribution(AgeDistribution),
    /// Dataset summary rows
    DatasetSummary(Vec<DatasetSummary>),
    /// Unified per-state estimates
    UnifiedStateMetrics(Vec<UnifiedStateMetric>),
}

/// The analytical caching/query engine
///
/// Cheap to share: wrap it in an `Arc` and hand clones to every caller.
pub struct AnalyticsEngine {
    /// Engine configuration (dataset layout, TTL tiers, scan pool)
    config: Config,

    /// TTL-bound result cache
    cache: CacheStore<QueryKey, CachedPayload>,

    /// State → districts / months lookup index
    index: Arc<IndexBuilder>,

    /// Per-key rebuild coordination
    flights: FlightGroup<QueryKey>,

    /// Bounds how many scans run concurrently on blocking workers
    scan_permits: Arc<Semaphore>,
}

impl AnalyticsEngine {
    /// Create an engine with a fresh cache and index.
    pub fn new(config: Config) -> Self {
        Self::with_stores(config, CacheStore::new(), Arc::new(IndexBuilder::new()))
    }

    /// Create an engine around an externally-constructed cache/index pair.
    ///
    /// Lets the process own the lifecycle of the derived state (and lets
    /// tests observe it directly).
    pub fn with_stores(
        config: Config,
        cache: CacheStore<QueryKey, CachedPayload>,
        index: Arc<IndexBuilder>,
    ) -> Self {
        info!(
            dataset_root = %config.dataset.root.display(),
            max_concurrent_scans = config.scan.max_concurrent_scans,
            ttl_short_secs = config.cache.ttl_short_secs,
            ttl_long_secs = config.cache.ttl_long_secs,
            "Creating analytics engine"
        );
        let scan_permits = Arc::new(Semaphore::new(config.scan.max_concurrent_scans.max(1)));
        Self {
            config,
            cache,
            index,
            flights: FlightGroup::new(),
            scan_permits,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sorted list of states some scan has seen so far.
    ///
    /// Empty until at least one full scan (e.g. [`Self::state_distribution`])
    /// has populated the index.
    pub fn available_states(&self) -> Vec<String> {
        self.index.states()
    }

    /// Sorted districts indexed for `state`.
    pub fn available_districts(&self, state: &str) -> Vec<String> {
        self.index.districts(state)
    }

    /// Run a fold on the bounded blocking pool.
    async fn run_scan<T, F>(&self, fold: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = self
            .scan_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::ScanWorker(e.to_string()))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            fold()
        })
        .await
        .map_err(|e| Error::ScanWorker(e.to_string()))
    }

    /// The common cached-scan flow: cache get, single-flight lock, re-check,
    /// bounded rebuild, cache set.
    async fn get_or_build<T>(
        &self,
        key: QueryKey,
        ttl: Duration,
        build: impl FnOnce() -> T + Send + 'static,
        wrap: impl FnOnce(T) -> CachedPayload,
        extract: impl Fn(CachedPayload) -> Option<T>,
    ) -> Result<T>
    where
        T: Clone + Send + 'static,
    {
        if let Some(hit) = self.cache.get(&key).and_then(&extract) {
            return Ok(hit);
        }

        let guard = self.flights.lock(key.clone()).await;
        if let Some(hit) = self.cache.get(&key).and_then(&extract) {
            drop(guard);
            self.flights.forget(&key);
            debug!(?key, "Rebuilt by a concurrent caller while waiting");
            return Ok(hit);
        }

        debug!(?key, "Cache miss, scanning");
        match self.run_scan(build).await {
            Ok(value) => {
                self.cache.set(key.clone(), wrap(value.clone()), ttl);
                drop(guard);
                self.flights.forget(&key);
                Ok(value)
            }
            Err(e) => {
                drop(guard);
                self.flights.forget(&key);
                Err(e)
            }
        }
    }
}
