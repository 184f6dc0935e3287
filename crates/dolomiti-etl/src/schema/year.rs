//! Reporting year inference.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

static FOUR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}").expect("Invalid regex: four digits"));

pub fn is_plausible_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Year from the digits of a file name.
///
/// All digits are concatenated and parsed, so `turismo-2023-v2.txt` gives
/// `20232` and is rejected as implausible.
pub fn year_from_file_name(file_name: &str) -> Option<i32> {
    let digits: String = file_name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    digits
        .parse::<i32>()
        .ok()
        .filter(|year| is_plausible_year(*year))
}

/// Year from an `anno` cell, tolerating stray text such as `Anno 2023` or `2023.0`.
pub fn year_from_cell(cell: &str) -> Option<i32> {
    FOUR_DIGITS
        .find_iter(cell)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .find(|year| is_plausible_year(*year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_file_name() {
        assert_eq!(
            year_from_file_name("turismo-per-mese-comune-2023-presenze.txt"),
            Some(2023)
        );
        assert_eq!(year_from_file_name("presenze-dolomiti-estero-2019.txt"), Some(2019));
        assert_eq!(year_from_file_name("presenze.txt"), None);
        assert_eq!(year_from_file_name("turismo-2023-v2.txt"), None);
        assert_eq!(year_from_file_name("dati-12.txt"), None);
    }

    #[test]
    fn test_year_from_cell() {
        assert_eq!(year_from_cell("2023"), Some(2023));
        assert_eq!(year_from_cell("Anno 2022"), Some(2022));
        assert_eq!(year_from_cell("2021.0"), Some(2021));
        assert_eq!(year_from_cell("n.d."), None);
        assert_eq!(year_from_cell("0042"), None);
    }
}
