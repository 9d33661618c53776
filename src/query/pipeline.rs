//! Sorting and pagination over the cached explorer row set
//!
//! Sorting never mutates the cached rows; the engine hands in a copy. The
//! sort is stable, so repeated requests with the same parameters slice the
//! row set identically and pages concatenate back to the full set.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::types::{ExplorerPage, ExplorerRow};

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (the default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Parse a loose request parameter; anything but `desc` (any casing)
    /// is ascending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// A field value lifted to a sortable representation.
///
/// Homogeneous kinds compare naturally; a mixed pair falls back to
/// lexicographic comparison of the string renderings. A row missing a
/// numeric field sorts as `-1`, a missing string field as `""`.
enum SortValue<'a> {
    Int(i64),
    Str(&'a str),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Str(a), SortValue::Str(b)) => a.cmp(b),
            (a, b) => a.render().cmp(&b.render()),
        }
    }

    fn render(&self) -> String {
        match self {
            SortValue::Int(v) => v.to_string(),
            SortValue::Str(s) => (*s).to_string(),
        }
    }
}

/// Look up a row field by its public name.
fn field_value<'a>(row: &'a ExplorerRow, field: &str) -> Option<SortValue<'a>> {
    match field {
        "date" => Some(SortValue::Str(&row.date)),
        "state" => Some(SortValue::Str(&row.state)),
        "district" => Some(SortValue::Str(&row.district)),
        "pincode" => Some(SortValue::Str(&row.pincode)),
        "age_0_5" => Some(SortValue::Int(row.age_0_5 as i64)),
        "age_5_17" => Some(SortValue::Int(row.age_5_17 as i64)),
        "age_18_greater" => Some(SortValue::Int(row.age_18_greater as i64)),
        _ => None,
    }
}

/// Sort rows in place by a named field.
///
/// An unknown field name leaves the order untouched (bad parameters degrade
/// to "no filter", they never reject the request). The sort is stable.
pub fn sort_rows(rows: &mut [ExplorerRow], field: &str, order: SortOrder) {
    // Probe the field name once instead of per comparison.
    let probe = ExplorerRow {
        date: String::new(),
        state: String::new(),
        district: String::new(),
        pincode: String::new(),
        age_0_5: 0,
        age_5_17: 0,
        age_18_greater: 0,
    };
    if field_value(&probe, field).is_none() {
        return;
    }

    rows.sort_by(|a, b| {
        let av = field_value(a, field).unwrap_or(SortValue::Int(-1));
        let bv = field_value(b, field).unwrap_or(SortValue::Int(-1));
        let ordering = av.compare(&bv);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Slice out a 1-based page and report the pre-slice total.
pub fn paginate(rows: &[ExplorerRow], page: usize, limit: usize) -> ExplorerPage {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(limit).min(rows.len());
    let end = start.saturating_add(limit).min(rows.len());
    ExplorerPage {
        rows: rows[start..end].to_vec(),
        total: rows.len(),
        page,
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, state: &str, district: &str, age: u64) -> ExplorerRow {
        ExplorerRow {
            date: date.to_string(),
            state: state.to_string(),
            district: district.to_string(),
            pincode: "600001".to_string(),
            age_0_5: age,
            age_5_17: 0,
            age_18_greater: 0,
        }
    }

    fn fixture() -> Vec<ExplorerRow> {
        vec![
            row("2024-02-01", "Kerala", "Kollam", 30),
            row("2024-01-01", "Odisha", "Puri", 10),
            row("2024-03-01", "Goa", "North Goa", 20),
        ]
    }

    #[test]
    fn test_order_from_param() {
        assert_eq!(SortOrder::from_param(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(None), SortOrder::Asc);
    }

    #[test]
    fn test_sort_string_field() {
        let mut rows = fixture();
        sort_rows(&mut rows, "state", SortOrder::Asc);
        let states: Vec<&str> = rows.iter().map(|r| r.state.as_str()).collect();
        assert_eq!(states, vec!["Goa", "Kerala", "Odisha"]);
    }

    #[test]
    fn test_sort_numeric_field_desc() {
        let mut rows = fixture();
        sort_rows(&mut rows, "age_0_5", SortOrder::Desc);
        let ages: Vec<u64> = rows.iter().map(|r| r.age_0_5).collect();
        assert_eq!(ages, vec![30, 20, 10]);
    }

    #[test]
    fn test_unknown_field_leaves_order() {
        let mut rows = fixture();
        let original: Vec<String> = rows.iter().map(|r| r.state.clone()).collect();
        sort_rows(&mut rows, "no_such_field", SortOrder::Desc);
        let after: Vec<String> = rows.iter().map(|r| r.state.clone()).collect();
        assert_eq!(original, after);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut rows = vec![
            row("2024-01-01", "Kerala", "Kollam", 5),
            row("2024-01-02", "Kerala", "Ernakulam", 5),
            row("2024-01-03", "Kerala", "Thrissur", 5),
        ];
        sort_rows(&mut rows, "age_0_5", SortOrder::Asc);
        let districts: Vec<&str> = rows.iter().map(|r| r.district.as_str()).collect();
        assert_eq!(districts, vec!["Kollam", "Ernakulam", "Thrissur"]);
    }

    #[test]
    fn test_paginate_slices_and_totals() {
        let rows = fixture();
        let page = paginate(&rows, 1, 2);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.total, 3);

        let page = paginate(&rows, 2, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total, 3);

        let page = paginate(&rows, 3, 2);
        assert!(page.rows.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_paginate_page_zero_treated_as_first() {
        let rows = fixture();
        let page = paginate(&rows, 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.rows.len(), 2);
    }

    #[test]
    fn test_pages_concatenate_to_full_set() {
        let mut rows = fixture();
        sort_rows(&mut rows, "date", SortOrder::Asc);

        for limit in 1..=4 {
            let mut gathered = Vec::new();
            let mut page_no = 1;
            loop {
                let page = paginate(&rows, page_no, limit);
                if page.rows.is_empty() {
                    break;
                }
                gathered.extend(page.rows);
                page_no += 1;
            }
            assert_eq!(gathered, rows, "limit {limit}");
        }
    }
}
