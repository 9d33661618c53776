//! Explorer request parameters and row filtering
//!
//! Filter values arrive as loose strings from the API layer and are
//! normalized exactly once, before the scan and before cache-key
//! derivation: the state filter is canonicalized the same way row states
//! are, text filters are lowercased, and date bounds are parsed. An
//! unparsable or blank filter value degrades to "no filter" rather than
//! rejecting the request.

use chrono::NaiveDate;

use crate::normalize::normalize_state;
use crate::parse::parse_date;
use crate::query::pipeline::SortOrder;

/// Default page size for the explorer
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Raw explorer request parameters as the API layer supplies them
#[derive(Debug, Clone, Default)]
pub struct ExplorerParams {
    /// State filter (substring of the canonical state, case-insensitive)
    pub state: Option<String>,
    /// District filter (substring, case-insensitive)
    pub district: Option<String>,
    /// Inclusive lower date bound, `YYYY-MM-DD`
    pub date_from: Option<String>,
    /// Inclusive upper date bound, `YYYY-MM-DD`
    pub date_to: Option<String>,
    /// Free-text search across state, district, and date
    pub search: Option<String>,
    /// Field to sort by; unknown names leave the row order untouched
    pub sort: Option<String>,
    /// Sort direction
    pub order: SortOrder,
    /// 1-based page index (0 is treated as 1)
    pub page: usize,
    /// Page size; 0 falls back to [`DEFAULT_PAGE_LIMIT`]
    pub limit: usize,
}

impl ExplorerParams {
    /// Effective 1-based page index
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Effective page size
    pub fn limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit
        }
    }
}

/// Normalized filter set applied to every scanned row
///
/// Equality of two filters implies the same row set, which is what makes
/// this safe to embed in the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplorerFilter {
    state: Option<String>,
    district: Option<String>,
    search: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

impl ExplorerFilter {
    /// Normalize request parameters into a filter.
    ///
    /// The state filter runs through the same canonicalization as row
    /// states so that e.g. `WESTBENGAL` matches rows keyed `West Bengal`;
    /// a filter value the normalizer rejects outright is kept as typed
    /// (it will simply match nothing canonical). Unparsable date bounds
    /// become no-ops.
    pub fn from_params(params: &ExplorerParams) -> Self {
        let state = non_blank(params.state.as_deref()).map(|raw| {
            normalize_state(raw)
                .unwrap_or_else(|| raw.to_string())
                .to_lowercase()
        });
        let district = non_blank(params.district.as_deref()).map(str::to_lowercase);
        let search = non_blank(params.search.as_deref()).map(str::to_lowercase);
        let date_from = non_blank(params.date_from.as_deref()).and_then(parse_date);
        let date_to = non_blank(params.date_to.as_deref()).and_then(parse_date);
        Self {
            state,
            district,
            search,
            date_from,
            date_to,
        }
    }

    /// Whether a date bound is in effect.
    ///
    /// Only then are rows with unparsable dates excluded; without a bound
    /// they still contribute to the explorer.
    pub fn has_date_bound(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Check a row (already state-canonicalized) against every filter.
    pub fn matches(&self, state: &str, district: &str, date_raw: &str) -> bool {
        if let Some(wanted) = &self.state {
            if !state.to_lowercase().contains(wanted) {
                return false;
            }
        }
        if let Some(wanted) = &self.district {
            if !district.to_lowercase().contains(wanted) {
                return false;
            }
        }

        if self.has_date_bound() {
            let Some(date) = parse_date(date_raw) else {
                return false;
            };
            if let Some(from) = self.date_from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = self.date_to {
                if date > to {
                    return false;
                }
            }
        }

        if let Some(needle) = &self.search {
            let haystacks = [state, district, date_raw];
            if !haystacks
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
            {
                return false;
            }
        }

        true
    }
}
