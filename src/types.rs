//! Core data types shared across the analytics engine
//!
//! # Key Types
//!
//! - **`DatasetKind`**: the three record categories (enrollment,
//!   demographic, biometric) and their column contracts
//! - **`StateCount`** / **`TimelinePoint`** / **`DemographicsRow`** /
//!   **`CoverageGap`**: aggregate result rows
//! - **`ExplorerRow`** / **`ExplorerPage`**: the unified multi-source
//!   explorer row (composite-keyed) and a paginated slice of it
//!
//! Result rows derive `Serialize` so the API layer can encode them without
//! further mapping.

use serde::Serialize;

/// The three record categories a dataset root contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// New enrollment activity
    Enrollment,
    /// Demographic update activity
    Demographic,
    /// Biometric update activity
    Biometric,
}

impl DatasetKind {
    /// All categories, in scan order
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Enrollment,
        DatasetKind::Demographic,
        DatasetKind::Biometric,
    ];

    /// Stable lowercase label used in reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Enrollment => "enrollment",
            DatasetKind::Demographic => "demographic",
            DatasetKind::Biometric => "biometric",
        }
    }

    /// The column names the engine reads from this category
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Enrollment => {
                &["date", "state", "district", "pincode", "age_0_5", "age_5_17", "age_18_greater"]
            }
            DatasetKind::Demographic => {
                &["date", "state", "district", "pincode", "demo_age_5_17", "demo_age_17_plus"]
            }
            DatasetKind::Biometric => {
                &["date", "state", "district", "pincode", "bio_age_5_17", "bio_age_17_plus"]
            }
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Column-name contracts, including the alternate spellings that appear in
/// the wild across source files.
pub mod columns {
    /// Record date (two layouts, see [`crate::parse::parse_date`])
    pub const DATE: &str = "date";
    /// Raw state label (normalized before any use)
    pub const STATE: &str = "state";
    /// District name
    pub const DISTRICT: &str = "district";
    /// Postal code
    pub const PINCODE: &str = "pincode";

    /// Enrollment age buckets
    pub const AGE_0_5: &str = "age_0_5";
    /// Enrollment age buckets
    pub const AGE_5_17: &str = "age_5_17";
    /// Enrollment age buckets
    pub const AGE_18_GREATER: &str = "age_18_greater";

    /// Demographic 5-17 bucket and its observed alternate spellings
    pub const DEMO_AGE_5_17: &[&str] =
        &["demo_age_5_17", "demo_age_5-17", "demo_age_5_17 ", "demo_age_5-17 "];
    /// Demographic 17+ bucket and its observed alternate spellings
    pub const DEMO_AGE_17_PLUS: &[&str] =
        &["demo_age_17_plus", "demo_age_17_", "demo_age_17", "demo_age_17+"];

    /// Biometric 5-17 bucket and its observed alternate spellings
    pub const BIO_AGE_5_17: &[&str] = &["bio_age_5_17", "bio_age_5-17"];
    /// Biometric 17+ bucket and its observed alternate spellings
    pub const BIO_AGE_17_PLUS: &[&str] = &["bio_age_17_plus", "bio_age_17_", "bio_age_17"];
}

/// Per-state enrollment total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    /// Canonical state name
    pub state: String,
    /// Sum of all enrollment age buckets
    pub total_enrollments: u64,
}

/// One month of the enrollment timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    /// Month rendered as `YYYY-MM-01`
    pub month: String,
    /// Sum of all enrollment age buckets in that month
    pub total: u64,
}

/// Per-state demographic bucket totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicsRow {
    /// Canonical state name
    pub state: String,
    /// 5-17 demographic bucket total
    pub demo_age_5_17: u64,
    /// 17+ demographic bucket total
    pub demo_age_17_plus: u64,
    /// Sum of both buckets
    pub total: u64,
}

/// A (state, district) pair ranked by how little recorded activity it has
///
/// Population and coverage percentage are placeholders for a census join
/// the platform does not ship yet; they serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGap {
    /// Canonical state name
    pub state: String,
    /// District name (may be empty when the source row lacked one)
    pub district: String,
    /// Sum of all enrollment age buckets for the pair
    pub enrollments: u64,
    /// Census population, when available
    pub population: Option<u64>,
    /// Enrollments over population, when available
    pub coverage_percentage: Option<f64>,
}

/// One merged row of the unified explorer
///
/// Keyed by the composite (date, state, district, pincode); buckets
/// accumulate across all three categories using category-specific columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorerRow {
    /// Raw date string as it appears in the source row
    pub date: String,
    /// Canonical state name
    pub state: String,
    /// District name
    pub district: String,
    /// Postal code
    pub pincode: String,
    /// 0-5 bucket (enrollment only)
    pub age_0_5: u64,
    /// 5-17 bucket (all categories)
    pub age_5_17: u64,
    /// 18+ bucket (all categories)
    pub age_18_greater: u64,
}

/// A page of explorer rows plus the pre-slice total
#[derive(Debug, Clone, Serialize)]
pub struct ExplorerPage {
    /// The requested slice of the sorted row set
    pub rows: Vec<ExplorerRow>,
    /// Total row count before pagination
    pub total: usize,
    /// 1-based page index as requested
    pub page: usize,
    /// Page size as requested
    pub limit: usize,
}
