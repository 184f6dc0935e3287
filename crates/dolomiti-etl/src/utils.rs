//! Shared string helpers for the normalization pipeline.
//!
//! This module centralizes the "dirty" text handling (quotes, BOMs, number
//! formats) so the rest of the pipeline can assume clean values.

// =============================================================================
// Text Cleaning
// =============================================================================

/// Byte order mark that some exports leave at the start of the first header.
pub const BOM: char = '\u{feff}';

/// Common missing-value markers found in the source spreadsheets.
pub const MISSING_MARKERS: [&str; 9] = ["", "-", "--", ".", "..", "n.d.", "nd", "n/a", "null"];

/// Remove surrounding quotes (single, double, repeated) and whitespace.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(strip_quotes("\"\"Belluno\"\""), "Belluno");
/// assert_eq!(strip_quotes("  'Feltre' "), "Feltre");
/// ```
pub fn strip_quotes(value: &str) -> String {
    let mut cleaned = value.trim();

    // bounded: each pass removes one pair
    for _ in 0..10 {
        let before = cleaned.len();
        for quote in ['"', '\''] {
            if cleaned.len() >= 2 && cleaned.starts_with(quote) && cleaned.ends_with(quote) {
                cleaned = cleaned[1..cleaned.len() - 1].trim();
            }
        }
        if cleaned.len() == before {
            break;
        }
    }

    cleaned.to_string()
}

/// Normalize a header cell into its canonical lookup form.
///
/// Strips the BOM and quotes, trims, lower-cases and collapses every run of
/// whitespace or underscores into a single `_`.
///
/// ```rust,ignore
/// assert_eq!(normalize_column_name(" Totale  Arrivi "), "totale_arrivi");
/// assert_eq!(normalize_column_name("\u{feff}Denominazione_Comune"), "denominazione_comune");
/// ```
pub fn normalize_column_name(raw: &str) -> String {
    let unquoted = strip_quotes(&raw.replace(BOM, ""));
    let mut normalized = String::with_capacity(unquoted.len());
    let mut pending_separator = false;

    for c in unquoted.chars() {
        if c.is_whitespace() || c == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !normalized.is_empty() {
            normalized.push('_');
        }
        pending_separator = false;
        normalized.extend(c.to_lowercase());
    }

    normalized
}

/// Alphabetic words of a string, lower-cased.
///
/// `"Gen_Presenze 2023"` yields `["gen", "presenze"]`.
pub fn alphabetic_words(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// =============================================================================
// Numeric Parsing
// =============================================================================

/// Check if a cell is one of the known missing-value markers.
pub fn is_missing_marker(value: &str) -> bool {
    let lower = strip_quotes(value).to_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Clean a cell for numeric parsing.
///
/// Removes quotes and all whitespace (including the non-breaking spaces
/// spreadsheet exports use as thousands separators), then resolves Italian
/// and English separator conventions into a plain `1234.5` form:
///
/// - `1.234,5` and `1,234.5` both become `1234.5` (the last separator is the
///   decimal one)
/// - a single comma is a decimal comma: `12,5` becomes `12.5`
/// - dots grouping digits in threes are thousands separators: `1.234` and
///   `1.234.567` become `1234` and `1234567`
pub fn clean_numeric_string(value: &str) -> String {
    let compact: String = strip_quotes(value)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();

    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (None, Some(_)) => {
            if compact.matches(',').count() == 1 {
                compact.replace(',', ".")
            } else {
                compact.replace(',', "")
            }
        }
        (Some(_), None) if is_thousands_grouped(&compact, '.') => compact.replace('.', ""),
        _ => compact,
    }
}

/// True when every group after the first separator has exactly three digits.
fn is_thousands_grouped(value: &str, separator: char) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut groups = digits.split(separator);
    let Some(head) = groups.next() else {
        return false;
    };
    let head_ok = !head.is_empty() && head.len() <= 3 && head.chars().all(|c| c.is_ascii_digit());
    let mut tail = groups.peekable();
    head_ok
        && tail.peek().is_some()
        && tail.all(|group| group.len() == 3 && group.chars().all(|c| c.is_ascii_digit()))
}

/// Try to parse a cell as a finite number.
///
/// Returns `None` for missing markers and anything that does not parse.
pub fn parse_numeric_string(value: &str) -> Option<f64> {
    if is_missing_marker(value) {
        return None;
    }
    let cleaned = clean_numeric_string(value);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
