//! Month label canonicalization.

use crate::types::Month;
use crate::utils::alphabetic_words;

/// Full month names, Italian and English.
const FULL_NAMES: [(&str, Month); 24] = [
    ("gennaio", Month::Gen),
    ("febbraio", Month::Feb),
    ("marzo", Month::Mar),
    ("aprile", Month::Apr),
    ("maggio", Month::Mag),
    ("giugno", Month::Giu),
    ("luglio", Month::Lug),
    ("agosto", Month::Ago),
    ("settembre", Month::Set),
    ("ottobre", Month::Ott),
    ("novembre", Month::Nov),
    ("dicembre", Month::Dic),
    ("january", Month::Gen),
    ("february", Month::Feb),
    ("march", Month::Mar),
    ("april", Month::Apr),
    ("may", Month::Mag),
    ("june", Month::Giu),
    ("july", Month::Lug),
    ("august", Month::Ago),
    ("september", Month::Set),
    ("october", Month::Ott),
    ("november", Month::Nov),
    ("december", Month::Dic),
];

/// Three-letter abbreviations. English ones never collide with Italian ones.
const ABBREVIATIONS: [(&str, Month); 20] = [
    ("gen", Month::Gen),
    ("jan", Month::Gen),
    ("feb", Month::Feb),
    ("mar", Month::Mar),
    ("apr", Month::Apr),
    ("mag", Month::Mag),
    ("giu", Month::Giu),
    ("jun", Month::Giu),
    ("lug", Month::Lug),
    ("jul", Month::Lug),
    ("ago", Month::Ago),
    ("aug", Month::Ago),
    ("set", Month::Set),
    ("sep", Month::Set),
    ("ott", Month::Ott),
    ("oct", Month::Ott),
    ("nov", Month::Nov),
    ("dic", Month::Dic),
    ("dec", Month::Dic),
    ("may", Month::Mag),
];

fn lookup(table: &[(&str, Month)], word: &str) -> Option<Month> {
    table
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, month)| *month)
}

/// Map an arbitrary month spelling onto the canonical [`Month`].
///
/// Accepts full Italian or English names, abbreviations, mixed case, stray
/// leading digits (`01Gennaio`) and bare month numbers (`3`, `03`). Returns
/// `None` for anything else, notably the `Totale` subtotal rows, which the
/// callers drop.
pub fn canonicalize_month(raw: &str) -> Option<Month> {
    let trimmed = raw.trim().trim_matches(|c: char| c == '"' || c == '\'');

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse::<u32>().ok().and_then(Month::from_number);
    }

    let word: String = trimmed
        .trim_start_matches(|c: char| !c.is_alphabetic())
        .chars()
        .take_while(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if word.is_empty() {
        return None;
    }

    if let Some(month) = lookup(&FULL_NAMES, &word) {
        return Some(month);
    }

    let prefix: String = word.chars().take(3).collect();
    lookup(&ABBREVIATIONS, &prefix)
}

/// Month named by a single word of a column header.
///
/// Stricter than [`canonicalize_month`]: the word must be a full name, an
/// exact abbreviation, or a truncation of a full name of at least three
/// letters (`sett`, `febbr`). `marche` or `settimana` are not months.
fn month_word(word: &str) -> Option<Month> {
    if let Some(month) = lookup(&FULL_NAMES, word).or_else(|| lookup(&ABBREVIATIONS, word)) {
        return Some(month);
    }
    if word.chars().count() < 3 {
        return None;
    }
    FULL_NAMES
        .iter()
        .find(|(name, _)| name.starts_with(word))
        .map(|(_, month)| *month)
}

/// Find the month token of a wide-format column header.
///
/// Returns the leading month word and its month, e.g.
/// `"Gen Presenze"` yields `("gen", Month::Gen)`.
pub fn month_token(column: &str) -> Option<(String, Month)> {
    alphabetic_words(column)
        .into_iter()
        .find_map(|word| month_word(&word).map(|month| (word, month)))
}
