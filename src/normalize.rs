//! State-name canonicalization
//!
//! The source files label the same region inconsistently: spelling variants
//! (`Orissa` / `Odisha`), casing variants (`WESTBENGAL` / `West bengal`),
//! and outright garbage in the state column (city names, a stray pincode).
//! Every aggregation and index key goes through [`normalize_state`] exactly
//! once so that records for the same region always land on the same key.
//!
//! The variant table is a literal contract: entries match case-sensitively,
//! exactly as listed. Some variants are listed in several casings, some in
//! one; unlisted casings pass through untouched and aggregate separately.
//! Entries mapping to `None` are known-invalid tokens and must be filtered
//! out of state-keyed aggregates rather than passed through.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Known spelling/case variants and known-invalid tokens.
///
/// `Some(canonical)` collapses the variant onto the canonical name;
/// `None` marks the token as not a state at all.
static STATE_VARIANTS: LazyLock<HashMap<&'static str, Option<&'static str>>> = LazyLock::new(|| {
    HashMap::from([
        // Andaman & Nicobar Islands variants
        ("Andaman & Nicobar Islands", Some("Andaman and Nicobar Islands")),
        ("andaman & nicobar islands", Some("Andaman and Nicobar Islands")),
        // Dadra & Nagar Haveli variants
        ("Dadra & Nagar Haveli", Some("Dadra and Nagar Haveli and Daman and Diu")),
        ("Dadra and Nagar Haveli", Some("Dadra and Nagar Haveli and Daman and Diu")),
        (
            "The Dadra And Nagar Haveli And Daman And Diu",
            Some("Dadra and Nagar Haveli and Daman and Diu"),
        ),
        // Daman & Diu variants
        ("Daman & Diu", Some("Dadra and Nagar Haveli and Daman and Diu")),
        ("Daman and Diu", Some("Dadra and Nagar Haveli and Daman and Diu")),
        // Jammu & Kashmir variants
        ("Jammu & Kashmir", Some("Jammu and Kashmir")),
        ("Jammu And Kashmir", Some("Jammu and Kashmir")),
        // Odisha variants
        ("ODISHA", Some("Odisha")),
        ("Orissa", Some("Odisha")),
        ("odisha", Some("Odisha")),
        // Puducherry variants
        ("Pondicherry", Some("Puducherry")),
        ("pondicherry", Some("Puducherry")),
        // West Bengal variants
        ("WESTBENGAL", Some("West Bengal")),
        ("WEST BENGAL", Some("West Bengal")),
        ("West  Bengal", Some("West Bengal")),
        ("West Bangal", Some("West Bengal")),
        ("West bengal", Some("West Bengal")),
        ("Westbengal", Some("West Bengal")),
        ("westbengal", Some("West Bengal")),
        ("West Bengli", Some("West Bengal")),
        ("west bengli", Some("West Bengal")),
        // Andhra Pradesh variants
        ("andhra pradesh", Some("Andhra Pradesh")),
        // Uttarakhand variants
        ("Uttaranchal", Some("Uttarakhand")),
        ("uttaranchal", Some("Uttarakhand")),
        // Chhattisgarh variants
        ("Chhatisgarh", Some("Chhattisgarh")),
        ("chhatisgarh", Some("Chhattisgarh")),
        // Invalid entries (cities, pincodes) seen in the state column
        ("Darbhanga", None),
        ("BALANAGAR", None),
        ("Jaipur", None),
        ("Madanapalle", None),
        ("100000", None),
        ("Puttenahalli", None),
        ("Nagpur", None),
        ("Raja Annamalai Puram", None),
    ])
});

/// Map a raw state string to its canonical name.
///
/// Returns `None` for empty input and for known-invalid tokens; callers must
/// drop such records from state-keyed aggregates and indices. Unrecognized
/// input is assumed already canonical and passes through trimmed.
///
/// Pure function: no side effects, stable output for a given input.
///
/// # Example
///
/// ```rust
/// use samvidhan_analytics::normalize::normalize_state;
///
/// assert_eq!(normalize_state("WESTBENGAL"), Some("West Bengal".to_string()));
/// assert_eq!(normalize_state("  Kerala "), Some("Kerala".to_string()));
/// assert_eq!(normalize_state("Jaipur"), None);
/// assert_eq!(normalize_state(""), None);
/// ```
pub fn normalize_state(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match STATE_VARIANTS.get(trimmed) {
        Some(Some(canonical)) => Some((*canonical).to_string()),
        Some(None) => None,
        None => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_collapse_to_canonical() {
        for raw in ["WESTBENGAL", "WEST BENGAL", "West  Bengal", "westbengal", "West Bengli"] {
            assert_eq!(normalize_state(raw).as_deref(), Some("West Bengal"), "variant {raw:?}");
        }
        assert_eq!(normalize_state("Orissa").as_deref(), Some("Odisha"));
        assert_eq!(normalize_state("Pondicherry").as_deref(), Some("Puducherry"));
        assert_eq!(normalize_state("Uttaranchal").as_deref(), Some("Uttarakhand"));
        assert_eq!(
            normalize_state("Daman & Diu").as_deref(),
            Some("Dadra and Nagar Haveli and Daman and Diu")
        );
    }

    #[test]
    fn test_exact_casing_only() {
        // Only the listed casings collapse; an unlisted casing passes through.
        assert_eq!(normalize_state("oRiSsA").as_deref(), Some("oRiSsA"));
    }

    #[test]
    fn test_invalid_tokens_filtered() {
        for raw in ["Darbhanga", "Jaipur", "100000", "Nagpur"] {
            assert_eq!(normalize_state(raw), None, "token {raw:?}");
        }
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(normalize_state(""), None);
        assert_eq!(normalize_state("   "), None);
    }

    #[test]
    fn test_passthrough_trims() {
        assert_eq!(normalize_state("  Tamil Nadu "), Some("Tamil Nadu".to_string()));
    }

    #[test]
    fn test_idempotent_on_canonical_values() {
        // Canonical outputs that are not themselves variant keys re-normalize
        // to themselves.
        for canonical in ["West Bengal", "Odisha", "Puducherry", "Uttarakhand", "Kerala"] {
            let once = normalize_state(canonical).unwrap();
            let twice = normalize_state(&once).unwrap();
            assert_eq!(once, twice);
        }
    }
}
