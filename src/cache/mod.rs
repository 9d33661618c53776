//! TTL-bound result caching
//!
//! [`store::CacheStore`] holds aggregation results with per-entry TTLs and
//! lazy expiry; [`flight::FlightGroup`] serializes concurrent rebuilds of
//! the same key so a cache miss storm performs one scan, not many.

pub mod flight;
pub mod store;

pub use flight::FlightGroup;
pub use store::{CacheStatsSnapshot, CacheStore};
