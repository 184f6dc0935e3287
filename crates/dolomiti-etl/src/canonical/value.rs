//! Metric value coercion.
//!
//! Policy: a metric cell that is blank, unparseable, non-finite or negative
//! becomes `0.0`. The value stays available to consumers, and the coercion
//! is flagged so callers can count it per file.

use crate::utils::parse_numeric_string;

/// A metric value after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoercedValue {
    pub value: f64,
    /// True when the source cell did not hold a usable number.
    pub coerced: bool,
}

impl CoercedValue {
    fn parsed(value: f64) -> Self {
        Self {
            value,
            coerced: false,
        }
    }

    fn zeroed() -> Self {
        Self {
            value: 0.0,
            coerced: true,
        }
    }
}

/// Coerce a raw cell into a non-negative number.
pub fn coerce_value(raw: &str) -> CoercedValue {
    match parse_numeric_string(raw) {
        Some(value) if value >= 0.0 => CoercedValue::parsed(value),
        _ => CoercedValue::zeroed(),
    }
}

/// Running count of coerced cells for one file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoercionCounter {
    pub coerced: usize,
}

impl CoercionCounter {
    /// Coerce `raw`, counting it when it had to be zeroed.
    pub fn coerce(&mut self, raw: &str) -> f64 {
        let result = coerce_value(raw);
        if result.coerced {
            self.coerced += 1;
        }
        result.value
    }
}
