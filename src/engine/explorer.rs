//! Unified multi-source explorer
//!
//! Merges the enrollment, demographic, and biometric categories into one
//! row set keyed by the composite (date, state, district, pincode) tuple.
//! Each category adds into the shared age buckets through its own column
//! names, so a pincode that enrolled children in January and updated
//! biometrics the same day shows up as a single merged row.
//!
//! Filtering happens during the scan; the cache payload is the complete
//! filtered row set, shared behind an `Arc`. Sorting and pagination are
//! applied per request, downstream of the cache, so different page/sort
//! combinations over the same filters reuse one scan.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::config::DatasetConfig;
use crate::engine::{AnalyticsEngine, CachedPayload, QueryKey};
use crate::error::Result;
use crate::index::IndexBuilder;
use crate::normalize::normalize_state;
use crate::parse::{month_key, safe_int};
use crate::query::filter::{ExplorerFilter, ExplorerParams};
use crate::query::pipeline::{paginate, sort_rows};
use crate::scan;
use crate::types::{columns, DatasetKind, ExplorerPage, ExplorerRow};

/// Composite key of one merged row
type RowKey = (String, String, String, String);

/// Running bucket sums for one composite key
#[derive(Default)]
struct AgeBuckets {
    age_0_5: u64,
    age_5_17: u64,
    age_18_greater: u64,
}

/// Fold all three categories into the filtered, merged row set.
///
/// The accumulator is a `BTreeMap` so the unsorted row order is a
/// deterministic function of the data, not of hash iteration.
pub(crate) fn scan_explorer(
    dataset: &DatasetConfig,
    index: &IndexBuilder,
    filter: &ExplorerFilter,
) -> Vec<ExplorerRow> {
    let mut agg: BTreeMap<RowKey, AgeBuckets> = BTreeMap::new();

    for kind in DatasetKind::ALL {
        let dir = dataset.category_dir(kind);
        scan::for_each_record(&dir, |rec| {
            let Some(state) = rec.get(columns::STATE).and_then(normalize_state) else {
                return;
            };
            let district = rec.get(columns::DISTRICT).unwrap_or("");
            let date = rec.get(columns::DATE).unwrap_or("");
            let pincode = rec.get(columns::PINCODE).unwrap_or("");

            if !filter.matches(&state, district, date) {
                return;
            }

            if !district.is_empty() {
                index.add_district(&state, district);
            }
            if let Some(month) = month_key(date) {
                index.add_month(&state, &month);
            }

            let buckets = agg
                .entry((
                    date.to_string(),
                    state,
                    district.to_string(),
                    pincode.to_string(),
                ))
                .or_default();
            match kind {
                DatasetKind::Enrollment => {
                    buckets.age_0_5 += safe_int(rec.get(columns::AGE_0_5));
                    buckets.age_5_17 += safe_int(rec.get(columns::AGE_5_17));
                    buckets.age_18_greater += safe_int(rec.get(columns::AGE_18_GREATER));
                }
                DatasetKind::Demographic => {
                    buckets.age_5_17 += safe_int(rec.first_of(columns::DEMO_AGE_5_17));
                    buckets.age_18_greater += safe_int(rec.first_of(columns::DEMO_AGE_17_PLUS));
                }
                DatasetKind::Biometric => {
                    buckets.age_5_17 += safe_int(rec.first_of(columns::BIO_AGE_5_17));
                    buckets.age_18_greater += safe_int(rec.first_of(columns::BIO_AGE_17_PLUS));
                }
            }
        });
    }

    agg.into_iter()
        .map(|((date, state, district, pincode), buckets)| ExplorerRow {
            date,
            state,
            district,
            pincode,
            age_0_5: buckets.age_0_5,
            age_5_17: buckets.age_5_17,
            age_18_greater: buckets.age_18_greater,
        })
        .collect()
}

impl AnalyticsEngine {
    /// One page of the unified explorer.
    ///
    /// The filter set determines the cache key; sort/order/page/limit only
    /// shape the returned slice.
    pub async fn explorer(&self, params: &ExplorerParams) -> Result<ExplorerPage> {
        let filter = ExplorerFilter::from_params(params);
        let key = QueryKey::Explorer(filter.clone());
        let dataset = self.config.dataset.clone();
        let index = Arc::clone(&self.index);

        let rows = self
            .get_or_build(
                key,
                self.config.cache.ttl_long(),
                move || Arc::new(scan_explorer(&dataset, &index, &filter)),
                CachedPayload::ExplorerRows,
                |payload| match payload {
                    CachedPayload::ExplorerRows(rows) => Some(rows),
                    _ => None,
                },
            )
            .await?;
        info!(total = rows.len(), "Explorer row set ready");

        let page = match params.sort.as_deref().map(str::trim) {
            Some(field) if !field.is_empty() => {
                // Sort a copy; the cached set stays untouched for other sorts.
                let mut sorted = rows.as_ref().clone();
                sort_rows(&mut sorted, field, params.order);
                paginate(&sorted, params.page(), params.limit())
            }
            _ => paginate(&rows, params.page(), params.limit()),
        };
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn dataset(root: PathBuf) -> DatasetConfig {
        DatasetConfig {
            root,
            ..DatasetConfig::default()
        }
    }

    fn write_category(config: &DatasetConfig, kind: DatasetKind, name: &str, contents: &str) {
        let dir = config.category_dir(kind);
        create_dir_all(&dir).unwrap();
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn no_filter() -> ExplorerFilter {
        ExplorerFilter::from_params(&ExplorerParams::default())
    }

    #[test]
    fn test_merges_categories_on_composite_key() {
        let tmp = TempDir::new().unwrap();
        let config = dataset(tmp.path().to_path_buf());
        write_category(
            &config,
            DatasetKind::Enrollment,
            "e.csv",
            "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n2024-01-01,Kerala,Kollam,691001,1,2,3\n",
        );
        write_category(
            &config,
            DatasetKind::Demographic,
            "d.csv",
            "date,state,district,pincode,demo_age_5_17,demo_age_17_\n2024-01-01,Kerala,Kollam,691001,10,20\n",
        );
        write_category(
            &config,
            DatasetKind::Biometric,
            "b.csv",
            "date,state,district,pincode,bio_age_5_17,bio_age_17_\n2024-01-01,Kerala,Kollam,691001,100,200\n",
        );

        let rows = scan_explorer(&config, &IndexBuilder::new(), &no_filter());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.age_0_5, 1);
        assert_eq!(row.age_5_17, 2 + 10 + 100);
        assert_eq!(row.age_18_greater, 3 + 20 + 200);
    }

    #[test]
    fn test_composite_key_separates_pincodes() {
        let tmp = TempDir::new().unwrap();
        let config = dataset(tmp.path().to_path_buf());
        write_category(
            &config,
            DatasetKind::Enrollment,
            "e.csv",
            "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n2024-01-01,Kerala,Kollam,691001,1,0,0\n2024-01-01,Kerala,Kollam,691002,2,0,0\n",
        );

        let rows = scan_explorer(&config, &IndexBuilder::new(), &no_filter());
        assert_eq!(rows.len(), 2);

        // No two rows share the full composite tuple.
        let mut keys: Vec<_> = rows
            .iter()
            .map(|r| (&r.date, &r.state, &r.district, &r.pincode))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), rows.len());
    }

    #[test]
    fn test_state_variants_collapse_into_one_row() {
        let tmp = TempDir::new().unwrap();
        let config = dataset(tmp.path().to_path_buf());
        write_category(
            &config,
            DatasetKind::Enrollment,
            "e.csv",
            "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n2024-01-01,West Bengal,X,700001,5,0,0\n2024-01-01,WESTBENGAL,X,700001,3,0,0\n",
        );

        let rows = scan_explorer(&config, &IndexBuilder::new(), &no_filter());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, "West Bengal");
        assert_eq!(rows[0].age_0_5, 8);
    }

    #[test]
    fn test_date_filter_excludes_unparsable_dates() {
        let tmp = TempDir::new().unwrap();
        let config = dataset(tmp.path().to_path_buf());
        write_category(
            &config,
            DatasetKind::Enrollment,
            "e.csv",
            "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n2024-01-15,Kerala,Kollam,691001,1,0,0\nunknown,Kerala,Kollam,691001,2,0,0\n2024-02-15,Kerala,Kollam,691001,4,0,0\n",
        );

        let filter = ExplorerFilter::from_params(&ExplorerParams {
            date_from: Some("2024-01-01".to_string()),
            date_to: Some("2024-01-31".to_string()),
            ..Default::default()
        });
        let rows = scan_explorer(&config, &IndexBuilder::new(), &filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-01-15");

        // Without a date bound the unparsable-date row is kept.
        let rows = scan_explorer(&config, &IndexBuilder::new(), &no_filter());
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_missing_category_directories_are_empty() {
        let tmp = TempDir::new().unwrap();
        let config = dataset(tmp.path().join("nowhere"));
        let rows = scan_explorer(&config, &IndexBuilder::new(), &no_filter());
        assert!(rows.is_empty());
    }
}
