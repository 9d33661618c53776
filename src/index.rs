//! Lookup indices maintained as a side effect of scans
//!
//! Two maps, both keyed by canonical state: the districts seen in that
//! state, and the year-months with recorded activity. They are populated
//! incrementally by every engine scan that touches a state; a state no
//! scan has visited is simply absent. The index is not TTL-bound: it only
//! grows, and shrinks through an explicit [`IndexBuilder::clear`] (the same
//! administrative operation that clears the cache, since both are derived,
//! rebuildable state).

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;
use serde::Serialize;

/// Point-in-time index counters for admin reports
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatsSnapshot {
    /// Number of states with at least one indexed district
    pub indexed_states: usize,
    /// Total indexed (state, month) pairs
    pub indexed_months: usize,
}

/// State → districts and state → year-months lookup maps
#[derive(Debug, Default)]
pub struct IndexBuilder {
    districts: RwLock<HashMap<String, BTreeSet<String>>>,
    months: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl IndexBuilder {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `district` was seen in `state`
    pub fn add_district(&self, state: &str, district: &str) {
        self.districts
            .write()
            .entry(state.to_string())
            .or_default()
            .insert(district.to_string());
    }

    /// Record that `month` (a `YYYY-MM` key) had activity in `state`
    pub fn add_month(&self, state: &str, month: &str) {
        self.months
            .write()
            .entry(state.to_string())
            .or_default()
            .insert(month.to_string());
    }

    /// Sorted list of every indexed state
    pub fn states(&self) -> Vec<String> {
        let mut states: Vec<String> = self.districts.read().keys().cloned().collect();
        states.sort();
        states
    }

    /// Sorted districts indexed for `state` (empty when the state is unknown)
    pub fn districts(&self, state: &str) -> Vec<String> {
        self.districts
            .read()
            .get(state)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Wipe both maps
    pub fn clear(&self) {
        self.districts.write().clear();
        self.months.write().clear();
    }

    /// Drop degenerate empty-string keys accumulated from blank labels.
    ///
    /// Returns the number of keys removed across both maps.
    pub fn compact(&self) -> usize {
        let mut removed = 0;
        for map in [&self.districts, &self.months] {
            let mut guard = map.write();
            let before = guard.len();
            guard.retain(|state, _| !state.trim().is_empty());
            removed += before - guard.len();
        }
        removed
    }

    /// Counters for the admin reports
    pub fn stats(&self) -> IndexStatsSnapshot {
        IndexStatsSnapshot {
            indexed_states: self.districts.read().len(),
            indexed_months: self.months.read().values().map(BTreeSet::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_reads() {
        let index = IndexBuilder::new();
        index.add_district("Kerala", "Kollam");
        index.add_district("Kerala", "Ernakulam");
        index.add_district("Goa", "North Goa");

        assert_eq!(index.states(), vec!["Goa", "Kerala"]);
        assert_eq!(index.districts("Kerala"), vec!["Ernakulam", "Kollam"]);
        assert!(index.districts("Punjab").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let index = IndexBuilder::new();
        index.add_district("Kerala", "Kollam");
        index.add_district("Kerala", "Kollam");
        index.add_month("Kerala", "2024-01");
        index.add_month("Kerala", "2024-01");

        assert_eq!(index.districts("Kerala").len(), 1);
        assert_eq!(index.stats().indexed_months, 1);
    }

    #[test]
    fn test_clear_wipes_everything() {
        let index = IndexBuilder::new();
        index.add_district("Kerala", "Kollam");
        index.add_month("Kerala", "2024-01");
        index.clear();

        assert!(index.states().is_empty());
        let stats = index.stats();
        assert_eq!(stats.indexed_states, 0);
        assert_eq!(stats.indexed_months, 0);
    }

    #[test]
    fn test_compact_drops_empty_keys() {
        let index = IndexBuilder::new();
        index.add_district("", "Somewhere");
        index.add_district("Kerala", "Kollam");
        index.add_month("", "2024-01");

        assert_eq!(index.compact(), 2);
        assert_eq!(index.states(), vec!["Kerala"]);
    }
}
