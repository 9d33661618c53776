//! Sampled (approximate) combined-dataset views
//!
//! Some dashboard summaries span all three categories and would cost a full
//! triple scan for numbers nobody reads precisely. The operations here trade
//! exactness for speed by reading only a fixed prefix of each category
//! (first file, capped row counts) or by deriving estimates from an exact
//! aggregate. Every result type spells out that it is sampled or estimated;
//! the exhaustive counterparts live in [`crate::engine::aggregates`] and
//! [`crate::engine::explorer`].

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::engine::{AnalyticsEngine, CachedPayload, QueryKey};
use crate::error::Result;
use crate::normalize::normalize_state;
use crate::parse::safe_int;
use crate::scan;
use crate::types::{columns, DatasetKind};

/// Files read per category by the combined-demographics sample
const COMBINED_SAMPLE_FILES: usize = 1;
/// Row cap per sampled file
const COMBINED_SAMPLE_ROWS: usize = 50_000;
/// Demographic files read by the age-distribution sample
const AGE_SAMPLE_DEMO_FILES: usize = 3;
/// Enrollment files read for the 0-5 bucket of the age-distribution sample
const AGE_SAMPLE_ENROLL_FILES: usize = 2;

/// Enrollment bucket sums over the sampled prefix
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrollmentSample {
    /// 0-5 bucket sum
    pub age_0_5: u64,
    /// 5-17 bucket sum
    pub age_5_17: u64,
    /// 18+ bucket sum
    pub age_18_greater: u64,
    /// Rows sampled
    pub records: u64,
}

/// Demographic bucket sums over the sampled prefix
#[derive(Debug, Clone, Default, Serialize)]
pub struct DemographicSample {
    /// 5-17 bucket sum
    pub demo_age_5_17: u64,
    /// 17+ bucket sum
    pub demo_age_17_plus: u64,
    /// Rows sampled
    pub records: u64,
}

/// Biometric bucket sums over the sampled prefix
#[derive(Debug, Clone, Default, Serialize)]
pub struct BiometricSample {
    /// 5-17 bucket sum
    pub bio_age_5_17: u64,
    /// 17+ bucket sum
    pub bio_age_17_plus: u64,
    /// Rows sampled
    pub records: u64,
}

/// Sampled cross-category bucket totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct CombinedDemographics {
    /// Enrollment prefix sums
    pub enrollment: EnrollmentSample,
    /// Demographic prefix sums
    pub demographic: DemographicSample,
    /// Biometric prefix sums
    pub biometric: BiometricSample,
    /// Rows sampled across all categories
    pub total_records: u64,
    /// Files actually read
    pub files_sampled: usize,
}

/// One bar of the sampled age pyramid
#[derive(Debug, Clone, Serialize)]
pub struct AgeGroupCount {
    /// Bucket label (`0-5`, `5-17`, `18+`)
    pub age_group: &'static str,
    /// Sampled count
    pub count: u64,
    /// Which category the bucket came from
    pub source: &'static str,
}

/// Sampled per-location demographic volume
#[derive(Debug, Clone, Serialize)]
pub struct LocationCount {
    /// Canonical state name
    pub location: String,
    /// Sampled count
    pub count: u64,
}

/// Sampled age-group pyramid with top locations
#[derive(Debug, Clone, Serialize)]
pub struct AgeDistribution {
    /// Counts per age bucket
    pub by_age_group: Vec<AgeGroupCount>,
    /// Top-20 locations by sampled demographic volume
    pub by_location: Vec<LocationCount>,
    /// Sum of the sampled demographic buckets
    pub total_demographic_records: u64,
    /// Files actually read
    pub files_sampled: usize,
}

/// Per-category dataset facts with an estimated record count
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    /// Record category
    pub category: DatasetKind,
    /// Category directory
    pub path: String,
    /// Whether the directory holds at least one data file
    pub available: bool,
    /// Number of data files
    pub file_count: usize,
    /// First-file row count times file count, an estimate rather than a scan
    pub estimated_records: usize,
    /// The columns the engine reads from this category
    pub columns: &'static [&'static str],
}

/// Per-state record estimates across all three categories
///
/// Enrollment counts are exact (from the state distribution); the other
/// categories are fixed-ratio projections, good enough for dashboard
/// proportions but not for reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedStateMetric {
    /// Canonical state name
    pub state: String,
    /// Exact enrollment total
    pub enrollment_records: u64,
    /// Projected demographic volume
    pub estimated_demographic_records: u64,
    /// Projected biometric volume
    pub estimated_biometric_records: u64,
    /// Projected volume across all categories
    pub estimated_total_records: u64,
}

/// Fold: prefix sums of every category's buckets.
pub(crate) fn scan_combined_demographics(
    enrollment_dir: &Path,
    demographic_dir: &Path,
    biometric_dir: &Path,
) -> CombinedDemographics {
    let mut combined = CombinedDemographics::default();

    scan::for_each_record_sampled(enrollment_dir, COMBINED_SAMPLE_FILES, COMBINED_SAMPLE_ROWS, |rec| {
        combined.enrollment.age_0_5 += safe_int(rec.get(columns::AGE_0_5));
        combined.enrollment.age_5_17 += safe_int(rec.get(columns::AGE_5_17));
        combined.enrollment.age_18_greater += safe_int(rec.get(columns::AGE_18_GREATER));
        combined.enrollment.records += 1;
    });
    scan::for_each_record_sampled(demographic_dir, COMBINED_SAMPLE_FILES, COMBINED_SAMPLE_ROWS, |rec| {
        combined.demographic.demo_age_5_17 += safe_int(rec.first_of(columns::DEMO_AGE_5_17));
        combined.demographic.demo_age_17_plus += safe_int(rec.first_of(columns::DEMO_AGE_17_PLUS));
        combined.demographic.records += 1;
    });
    scan::for_each_record_sampled(biometric_dir, COMBINED_SAMPLE_FILES, COMBINED_SAMPLE_ROWS, |rec| {
        combined.biometric.bio_age_5_17 += safe_int(rec.first_of(columns::BIO_AGE_5_17));
        combined.biometric.bio_age_17_plus += safe_int(rec.first_of(columns::BIO_AGE_17_PLUS));
        combined.biometric.records += 1;
    });

    combined.total_records = combined.enrollment.records
        + combined.demographic.records
        + combined.biometric.records;
    combined.files_sampled = [enrollment_dir, demographic_dir, biometric_dir]
        .iter()
        .map(|dir| scan::list_files(dir).len().min(COMBINED_SAMPLE_FILES))
        .sum();
    combined
}

/// Fold: sampled age pyramid plus top locations.
pub(crate) fn scan_age_distribution(
    enrollment_dir: &Path,
    demographic_dir: &Path,
) -> AgeDistribution {
    let mut demo_5_17 = 0u64;
    let mut demo_17_plus = 0u64;
    let mut by_location: std::collections::HashMap<String, u64> = std::collections::HashMap::new();

    scan::for_each_record_sampled(demographic_dir, AGE_SAMPLE_DEMO_FILES, usize::MAX, |rec| {
        let age_5_17 = safe_int(rec.first_of(columns::DEMO_AGE_5_17));
        let age_17_plus = safe_int(rec.first_of(columns::DEMO_AGE_17_PLUS));
        demo_5_17 += age_5_17;
        demo_17_plus += age_17_plus;
        if let Some(state) = rec.get(columns::STATE).and_then(normalize_state) {
            *by_location.entry(state).or_insert(0) += age_5_17 + age_17_plus;
        }
    });

    // The demographic files only cover ages five and up; the infant bucket
    // comes from the enrollment prefix.
    let mut enrollment_0_5 = 0u64;
    scan::for_each_record_sampled(enrollment_dir, AGE_SAMPLE_ENROLL_FILES, usize::MAX, |rec| {
        enrollment_0_5 += safe_int(rec.get(columns::AGE_0_5));
    });

    let mut locations: Vec<LocationCount> = by_location
        .into_iter()
        .map(|(location, count)| LocationCount { location, count })
        .collect();
    locations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
    locations.truncate(20);

    let demo_files = scan::list_files(demographic_dir).len().min(AGE_SAMPLE_DEMO_FILES);
    AgeDistribution {
        by_age_group: vec![
            AgeGroupCount {
                age_group: "0-5",
                count: enrollment_0_5,
                source: "enrollment_data",
            },
            AgeGroupCount {
                age_group: "5-17",
                count: demo_5_17,
                source: "demographic_data",
            },
            AgeGroupCount {
                age_group: "18+",
                count: demo_17_plus,
                source: "demographic_data",
            },
        ],
        by_location: locations,
        total_demographic_records: demo_5_17 + demo_17_plus,
        files_sampled: demo_files,
    }
}

/// Per-category facts with the first-file record estimate.
pub(crate) fn build_dataset_summary(config: &crate::config::DatasetConfig) -> Vec<DatasetSummary> {
    DatasetKind::ALL
        .into_iter()
        .map(|kind| {
            let dir = config.category_dir(kind);
            let files = scan::list_files(&dir);
            let estimated_records = if files.is_empty() {
                0
            } else {
                scan::first_file_row_count(&dir) * files.len()
            };
            DatasetSummary {
                category: kind,
                path: dir.display().to_string(),
                available: !files.is_empty(),
                file_count: files.len(),
                estimated_records,
                columns: kind.key_columns(),
            }
        })
        .collect()
}

impl AnalyticsEngine {
    /// Sampled bucket totals across all three categories.
    ///
    /// Reads at most the first file (capped at 50 000 rows) per category.
    pub async fn sampled_combined_demographics(&self) -> Result<CombinedDemographics> {
        let key = QueryKey::SampledCombinedDemographics;
        let enrollment = self.config.dataset.category_dir(DatasetKind::Enrollment);
        let demographic = self.config.dataset.category_dir(DatasetKind::Demographic);
        let biometric = self.config.dataset.category_dir(DatasetKind::Biometric);
        let combined = self
            .get_or_build(
                key,
                self.config.cache.ttl_long(),
                move || scan_combined_demographics(&enrollment, &demographic, &biometric),
                CachedPayload::CombinedDemographics,
                |payload| match payload {
                    CachedPayload::CombinedDemographics(combined) => Some(combined),
                    _ => None,
                },
            )
            .await?;
        info!(
            total_records = combined.total_records,
            "Sampled combined demographics ready"
        );
        Ok(combined)
    }

    /// Sampled age-group pyramid with top locations.
    pub async fn sampled_age_distribution(&self) -> Result<AgeDistribution> {
        let key = QueryKey::SampledAgeDistribution;
        let enrollment = self.config.dataset.category_dir(DatasetKind::Enrollment);
        let demographic = self.config.dataset.category_dir(DatasetKind::Demographic);
        self.get_or_build(
            key,
            self.config.cache.ttl_long(),
            move || scan_age_distribution(&enrollment, &demographic),
            CachedPayload::AgeDistribution,
            |payload| match payload {
                CachedPayload::AgeDistribution(distribution) => Some(distribution),
                _ => None,
            },
        )
        .await
    }

    /// Per-category file counts and estimated record counts.
    pub async fn dataset_summary(&self) -> Result<Vec<DatasetSummary>> {
        let key = QueryKey::DatasetSummary;
        let dataset = self.config.dataset.clone();
        self.get_or_build(
            key,
            self.config.cache.ttl_long(),
            move || build_dataset_summary(&dataset),
            CachedPayload::DatasetSummary,
            |payload| match payload {
                CachedPayload::DatasetSummary(rows) => Some(rows),
                _ => None,
            },
        )
        .await
    }

    /// Per-state record estimates across all categories.
    ///
    /// Enrollment counts come from the exact state distribution; the
    /// demographic/biometric columns are fixed-ratio projections.
    pub async fn unified_state_metrics(&self, limit: usize) -> Result<Vec<UnifiedStateMetric>> {
        let key = QueryKey::UnifiedStateMetrics { limit };
        if let Some(CachedPayload::UnifiedStateMetrics(rows)) = self.cache.get(&key) {
            return Ok(rows);
        }

        // Derived from another cached aggregate rather than its own scan, so
        // the single-flight dance is unnecessary here.
        let states = self.state_distribution(limit).await?;
        let rows: Vec<UnifiedStateMetric> = states
            .into_iter()
            .map(|state| {
                let total = state.total_enrollments;
                UnifiedStateMetric {
                    state: state.state,
                    enrollment_records: total,
                    estimated_demographic_records: (total as f64 * 0.97) as u64,
                    estimated_biometric_records: (total as f64 * 0.93) as u64,
                    estimated_total_records: (total as f64 * 2.9) as u64,
                }
            })
            .collect();
        self.cache.set(
            key,
            CachedPayload::UnifiedStateMetrics(rows.clone()),
            self.config.cache.ttl_long(),
        );
        Ok(rows)
    }
}
