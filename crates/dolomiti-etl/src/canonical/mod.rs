//! Month and value canonicalization.
//!
//! This module provides:
//! - Month label canonicalization onto the calendar-ordered [`Month`](crate::types::Month)
//! - Lossy numeric coercion of metric cells (invalid values become zero)
//! - Cleaning of entity labels (municipalities, countries)

mod month;
mod value;

pub use month::{canonicalize_month, month_token};
pub use value::{CoercedValue, CoercionCounter, coerce_value};

use crate::utils::{normalize_column_name, strip_quotes};
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading numeric code with its separator, e.g. the ISTAT code in `001 - Belluno`.
static LEADING_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\s*(?:[-–—:.)/]\s*|\s+)").expect("Invalid regex: leading code")
});

/// Name prefixes of aggregate buckets in the country-of-origin tables.
const AGGREGATE_PREFIXES: [&str; 4] = ["altri", "altro", "other", "totale"];

/// Clean an entity label such as a municipality or a country name.
///
/// Strips quotes and a leading numeric code with its separator:
/// `"001 - Belluno"` becomes `Belluno`. Labels that are only a number are
/// kept as they are.
pub fn clean_entity_name(raw: &str) -> String {
    let unquoted = strip_quotes(raw);
    let stripped = LEADING_CODE.replace(&unquoted, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        unquoted
    } else {
        strip_quotes(stripped)
    }
}

/// True for country labels that are an aggregate bucket rather than a country.
///
/// ```rust,ignore
/// assert!(is_aggregate_bucket("Altri Paesi"));
/// assert!(!is_aggregate_bucket("Germania"));
/// ```
pub fn is_aggregate_bucket(label: &str) -> bool {
    let normalized = normalize_column_name(label);
    AGGREGATE_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
        || normalized == "total"
}

/// True for a header or label naming a total (`Totale`, `TOTALE PRESENZE`, `Total`).
pub fn is_total_label(label: &str) -> bool {
    let normalized = normalize_column_name(label);
    normalized.starts_with("totale") || normalized == "total" || normalized.starts_with("total_")
}
