//! Exhaustive scan-and-fold aggregations
//!
//! Each operation walks the relevant category directory once, normalizes
//! every row's state, folds the age buckets into its accumulator, feeds the
//! lookup index on the way through, and caches the finished structure under
//! the long TTL. The fold bodies are plain functions so they can run on the
//! blocking pool and be exercised directly in tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::engine::{AnalyticsEngine, CachedPayload, QueryKey};
use crate::error::Result;
use crate::index::IndexBuilder;
use crate::normalize::normalize_state;
use crate::parse::{month_key, safe_int};
use crate::scan;
use crate::types::{columns, CoverageGap, DatasetKind, DemographicsRow, StateCount, TimelinePoint};

/// Sum of the three enrollment age buckets of one row
fn enrollment_total(rec: &scan::RawRecord) -> u64 {
    safe_int(rec.get(columns::AGE_0_5))
        + safe_int(rec.get(columns::AGE_5_17))
        + safe_int(rec.get(columns::AGE_18_GREATER))
}

/// Fold: per-canonical-state enrollment totals, descending, truncated.
pub(crate) fn scan_state_distribution(
    dir: &Path,
    index: &IndexBuilder,
    limit: usize,
) -> Vec<StateCount> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    scan::for_each_record(dir, |rec| {
        let Some(state) = rec.get(columns::STATE).and_then(normalize_state) else {
            return;
        };
        if let Some(district) = rec.get(columns::DISTRICT).filter(|d| !d.is_empty()) {
            index.add_district(&state, district);
        }
        *totals.entry(state).or_insert(0) += enrollment_total(rec);
    });

    let mut rows: Vec<StateCount> = totals
        .into_iter()
        .map(|(state, total_enrollments)| StateCount {
            state,
            total_enrollments,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_enrollments
            .cmp(&a.total_enrollments)
            .then_with(|| a.state.cmp(&b.state))
    });
    rows.truncate(limit);
    rows
}

/// Fold: monthly enrollment totals, ascending, last `months` kept.
pub(crate) fn scan_timeline(
    dir: &Path,
    index: &IndexBuilder,
    months: usize,
    state_filter: Option<&str>,
) -> Vec<TimelinePoint> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    scan::for_each_record(dir, |rec| {
        let canonical = rec.get(columns::STATE).and_then(normalize_state);
        if let Some(filter) = state_filter {
            // Stateless rows cannot match a state filter.
            let Some(state) = &canonical else { return };
            if !state.to_lowercase().contains(filter) {
                return;
            }
        }
        let Some(month) = rec.get(columns::DATE).and_then(month_key) else {
            return;
        };
        if let Some(state) = &canonical {
            index.add_month(state, &month);
        }
        *counts.entry(month).or_insert(0) += enrollment_total(rec);
    });

    let mut points: Vec<TimelinePoint> = counts
        .into_iter()
        .map(|(month, total)| TimelinePoint {
            month: format!("{month}-01"),
            total,
        })
        .collect();
    if months > 0 && points.len() > months {
        points.drain(..points.len() - months);
    }
    points
}

/// Fold: per-state demographic bucket totals, descending, truncated.
pub(crate) fn scan_demographics(
    dir: &Path,
    index: &IndexBuilder,
    limit: usize,
) -> Vec<DemographicsRow> {
    let mut totals: HashMap<String, (u64, u64)> = HashMap::new();
    scan::for_each_record(dir, |rec| {
        let Some(state) = rec.get(columns::STATE).and_then(normalize_state) else {
            return;
        };
        if let Some(district) = rec.get(columns::DISTRICT).filter(|d| !d.is_empty()) {
            index.add_district(&state, district);
        }
        let buckets = totals.entry(state).or_insert((0, 0));
        buckets.0 += safe_int(rec.first_of(columns::DEMO_AGE_5_17));
        buckets.1 += safe_int(rec.first_of(columns::DEMO_AGE_17_PLUS));
    });

    let mut rows: Vec<DemographicsRow> = totals
        .into_iter()
        .map(|(state, (demo_age_5_17, demo_age_17_plus))| DemographicsRow {
            state,
            demo_age_5_17,
            demo_age_17_plus,
            total: demo_age_5_17 + demo_age_17_plus,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.state.cmp(&b.state)));
    rows.truncate(limit);
    rows
}

/// Fold: per-(state, district) enrollment totals, ascending (lowest first).
pub(crate) fn scan_coverage_gaps(
    dir: &Path,
    index: &IndexBuilder,
    limit: usize,
) -> Vec<CoverageGap> {
    let mut totals: HashMap<(String, String), u64> = HashMap::new();
    scan::for_each_record(dir, |rec| {
        let Some(state) = rec.get(columns::STATE).and_then(normalize_state) else {
            return;
        };
        let district = rec.get(columns::DISTRICT).unwrap_or("").to_string();
        if !district.is_empty() {
            index.add_district(&state, &district);
        }
        *totals.entry((state, district)).or_insert(0) += enrollment_total(rec);
    });

    let mut rows: Vec<CoverageGap> = totals
        .into_iter()
        .map(|((state, district), enrollments)| CoverageGap {
            state,
            district,
            enrollments,
            population: None,
            coverage_percentage: None,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.enrollments
            .cmp(&b.enrollments)
            .then_with(|| a.state.cmp(&b.state))
            .then_with(|| a.district.cmp(&b.district))
    });
    rows.truncate(limit);
    rows
}

impl AnalyticsEngine {
    /// Enrollment distribution by state, highest totals first.
    pub async fn state_distribution(&self, limit: usize) -> Result<Vec<StateCount>> {
        let key = QueryKey::StateDistribution { limit };
        let dir = self.config.dataset.category_dir(DatasetKind::Enrollment);
        let index = Arc::clone(&self.index);
        let rows = self
            .get_or_build(
                key,
                self.config.cache.ttl_long(),
                move || scan_state_distribution(&dir, &index, limit),
                CachedPayload::StateDistribution,
                |payload| match payload {
                    CachedPayload::StateDistribution(rows) => Some(rows),
                    _ => None,
                },
            )
            .await?;
        info!(states = rows.len(), limit, "State distribution ready");
        Ok(rows)
    }

    /// Monthly enrollment timeline, oldest month first.
    ///
    /// `months` keeps only the trailing window (0 = unbounded); `state`
    /// restricts to rows whose canonical state contains the filter,
    /// case-insensitively.
    pub async fn enrollment_timeline(
        &self,
        months: usize,
        state: Option<&str>,
    ) -> Result<Vec<TimelinePoint>> {
        // Normalize the filter once so equivalent spellings share a key.
        let filter = state
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| {
                normalize_state(raw)
                    .unwrap_or_else(|| raw.to_string())
                    .to_lowercase()
            });
        let key = QueryKey::Timeline {
            months,
            state: filter.clone(),
        };
        let dir = self.config.dataset.category_dir(DatasetKind::Enrollment);
        let index = Arc::clone(&self.index);
        self.get_or_build(
            key,
            self.config.cache.ttl_long(),
            move || scan_timeline(&dir, &index, months, filter.as_deref()),
            CachedPayload::Timeline,
            |payload| match payload {
                CachedPayload::Timeline(points) => Some(points),
                _ => None,
            },
        )
        .await
    }

    /// Demographic bucket totals by state, highest totals first.
    pub async fn demographics(&self, limit: usize) -> Result<Vec<DemographicsRow>> {
        let key = QueryKey::Demographics { limit };
        let dir = self.config.dataset.category_dir(DatasetKind::Demographic);
        let index = Arc::clone(&self.index);
        self.get_or_build(
            key,
            self.config.cache.ttl_long(),
            move || scan_demographics(&dir, &index, limit),
            CachedPayload::Demographics,
            |payload| match payload {
                CachedPayload::Demographics(rows) => Some(rows),
                _ => None,
            },
        )
        .await
    }

    /// Under-served (state, district) pairs: lowest enrollment totals first.
    pub async fn coverage_gaps(&self, limit: usize) -> Result<Vec<CoverageGap>> {
        let key = QueryKey::CoverageGaps { limit };
        let dir = self.config.dataset.category_dir(DatasetKind::Enrollment);
        let index = Arc::clone(&self.index);
        self.get_or_build(
            key,
            self.config.cache.ttl_long(),
            move || scan_coverage_gaps(&dir, &index, limit),
            CachedPayload::CoverageGaps,
            |payload| match payload {
                CachedPayload::CoverageGaps(rows) => Some(rows),
                _ => None,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    const ENROLL_HEADER: &str = "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n";

    #[test]
    fn test_distribution_merges_spelling_variants() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            &format!("{ENROLL_HEADER}2024-01-01,West Bengal,X,700001,5,0,0\n"),
        );
        write_file(
            tmp.path(),
            "b.csv",
            &format!("{ENROLL_HEADER}2024-01-02,WESTBENGAL,X,700001,3,0,0\n"),
        );

        let index = IndexBuilder::new();
        let rows = scan_state_distribution(tmp.path(), &index, 20);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, "West Bengal");
        assert_eq!(rows[0].total_enrollments, 8);
        assert_eq!(index.districts("West Bengal"), vec!["X"]);
    }

    #[test]
    fn test_distribution_drops_invalid_states() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            &format!(
                "{ENROLL_HEADER}2024-01-01,Jaipur,X,302001,5,0,0\n2024-01-01,Kerala,Kollam,691001,2,0,0\n2024-01-01,,Kollam,691001,9,0,0\n"
            ),
        );

        let index = IndexBuilder::new();
        let rows = scan_state_distribution(tmp.path(), &index, 20);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, "Kerala");
        assert_eq!(rows[0].total_enrollments, 2);
    }

    #[test]
    fn test_distribution_tolerant_numeric_parsing() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            &format!("{ENROLL_HEADER}2024-01-01,Kerala,Kollam,691001,\"1,000\",n/a,23\n"),
        );

        let rows = scan_state_distribution(tmp.path(), &IndexBuilder::new(), 20);
        assert_eq!(rows[0].total_enrollments, 1023);
    }

    #[test]
    fn test_timeline_groups_both_date_layouts() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            &format!(
                "{ENROLL_HEADER}2024-01-05,Kerala,Kollam,691001,1,0,0\n20-01-2024,Kerala,Kollam,691001,2,0,0\n2024-02-01,Kerala,Kollam,691001,4,0,0\nunknown,Kerala,Kollam,691001,8,0,0\n"
            ),
        );

        let index = IndexBuilder::new();
        let points = scan_timeline(tmp.path(), &index, 0, None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].month, "2024-01-01");
        assert_eq!(points[0].total, 3);
        assert_eq!(points[1].month, "2024-02-01");
        assert_eq!(points[1].total, 4);
    }

    #[test]
    fn test_timeline_state_filter_and_window() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            &format!(
                "{ENROLL_HEADER}2024-01-05,West Bengal,X,700001,1,0,0\n2024-02-05,WESTBENGAL,X,700001,2,0,0\n2024-03-05,Kerala,Kollam,691001,4,0,0\n"
            ),
        );

        let index = IndexBuilder::new();
        let points = scan_timeline(tmp.path(), &index, 0, Some("west bengal"));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].total, 1);
        assert_eq!(points[1].total, 2);

        // Trailing window keeps the most recent months.
        let points = scan_timeline(tmp.path(), &index, 1, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month, "2024-03-01");
    }

    #[test]
    fn test_demographics_alternate_headers() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            "date,state,district,pincode,demo_age_5_17,demo_age_17_\n2024-01-01,Kerala,Kollam,691001,10,20\n",
        );
        write_file(
            tmp.path(),
            "b.csv",
            "date,state,district,pincode,demo_age_5-17,demo_age_17_plus\n2024-01-01,Kerala,Kollam,691001,1,2\n",
        );

        let rows = scan_demographics(tmp.path(), &IndexBuilder::new(), 20);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].demo_age_5_17, 11);
        assert_eq!(rows[0].demo_age_17_plus, 22);
        assert_eq!(rows[0].total, 33);
    }

    #[test]
    fn test_coverage_gaps_lowest_first() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "a.csv",
            &format!(
                "{ENROLL_HEADER}2024-01-01,Kerala,A,691001,100,0,0\n2024-01-01,Kerala,B,691002,5,0,0\n2024-01-01,Kerala,C,691003,50,0,0\n"
            ),
        );

        let rows = scan_coverage_gaps(tmp.path(), &IndexBuilder::new(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].district.as_str(), rows[0].enrollments), ("B", 5));
        assert_eq!((rows[1].district.as_str(), rows[1].enrollments), ("C", 50));
        assert!(rows[0].population.is_none());
    }
}
