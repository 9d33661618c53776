//! Tolerant value parsers for raw CSV fields
//!
//! Source files mix clean values with free-text noise: counts with embedded
//! commas or units, dates in two layouts, stray placeholders like
//! `"unknown"`. Parsers here never fail; they degrade to `0` or `None` so a
//! single bad field cannot abort a scan.

use chrono::NaiveDate;

/// Extract the integer value of a raw count field.
///
/// Keeps only the ASCII digit characters of the input and parses the result,
/// so `"1,234"`, `" 56 "` and `"78 persons"` all yield sensible counts.
/// Anything without digits (including `None`) yields 0. Values too large for
/// `u64` saturate at `u64::MAX` rather than failing.
///
/// # Example
///
/// ```rust
/// use samvidhan_analytics::parse::safe_int;
///
/// assert_eq!(safe_int(Some("1,234")), 1234);
/// assert_eq!(safe_int(Some("n/a")), 0);
/// assert_eq!(safe_int(None), 0);
/// ```
pub fn safe_int(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else { return 0 };
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// Parse a date in one of the two layouts the datasets use.
///
/// The layout is disambiguated by the first dash-delimited segment: a
/// 4-character segment means `YYYY-MM-DD`, anything else is tried as
/// `DD-MM-YYYY`. Returns `None` for empty or unparsable input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let first = raw.split('-').next().unwrap_or("");
    let format = if first.len() == 4 { "%Y-%m-%d" } else { "%d-%m-%Y" };
    NaiveDate::parse_from_str(raw, format).ok()
}

/// Reduce a raw date to its `YYYY-MM` month key, or `None` if unparsable.
pub fn month_key(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format("%Y-%m").to_string())
}
