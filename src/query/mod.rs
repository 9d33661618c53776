//! Query pipeline for the unified explorer
//!
//! The explorer aggregation caches the *full* filtered row set; everything
//! request-specific that does not change which rows exist happens here,
//! downstream of the cache:
//!
//! ```text
//! Request params
//!      │
//!      ▼
//! ┌──────────────┐
//! │   Filter     │  normalized once, applied during the scan
//! └──────────────┘
//!      │  (cached full row set)
//!      ▼
//! ┌──────────────┐
//! │    Sort      │  typed comparison, string fallback, stable
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Paginate    │  1-based page, pre-slice total
//! └──────────────┘
//! ```
//!
//! Different page/sort requests against the same filter set therefore reuse
//! one scan.

pub mod filter;
pub mod pipeline;

pub use filter::{ExplorerFilter, ExplorerParams};
pub use pipeline::{paginate, sort_rows, SortOrder};
