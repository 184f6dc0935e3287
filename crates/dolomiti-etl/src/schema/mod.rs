//! Schema normalization.
//!
//! Each domain declares a [`DomainSchema`]: an ordered list of
//! [`ColumnRule`]s mapping source column names onto canonical ones, plus the
//! canonical columns a file must provide. Adding a synonym or a domain is a
//! change to these tables, not to the normalization code.

pub mod year;

use crate::canonical::month_token;
use crate::diagnostics::SkipReason;
use crate::error::{EtlError, Result};
use crate::reader::RawTable;
use crate::utils::normalize_column_name;
use tracing::debug;

pub use year::{is_plausible_year, year_from_cell, year_from_file_name};

pub const COMUNE: &str = "comune";
pub const MESE: &str = "mese";
pub const ANNO: &str = "anno";
pub const ARRIVI: &str = "arrivi";
pub const PRESENZE: &str = "presenze";

/// How a rule compares a normalized column name against its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The name equals a source.
    Exact,
    /// The name contains a source. Columns carrying a month token never match,
    /// so `gen_totale_presenze` stays a wide value column.
    Contains,
}

/// Maps source column names onto one canonical column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub canonical: &'static str,
    /// Source names in normalized form (`totale_arrivi`, not `Totale Arrivi`).
    pub sources: &'static [&'static str],
    pub kind: MatchKind,
}

impl ColumnRule {
    pub fn matches(&self, normalized: &str) -> bool {
        match self.kind {
            MatchKind::Exact => self.sources.contains(&normalized),
            MatchKind::Contains => {
                month_token(normalized).is_none()
                    && self.sources.iter().any(|source| normalized.contains(source))
            }
        }
    }
}

/// Column vocabulary of one domain.
#[derive(Debug, Clone, Copy)]
pub struct DomainSchema {
    pub name: &'static str,
    /// Rules in priority order; the first rule to claim a canonical name wins.
    pub rules: &'static [ColumnRule],
    pub mandatory: &'static [&'static str],
    /// Canonical name given to the first column when no rule produced it.
    pub leading_column: Option<&'static str>,
}

const MONTH_RULE: ColumnRule = ColumnRule {
    canonical: MESE,
    sources: &["mese", "mesi", "mese_rilevazione", "month"],
    kind: MatchKind::Exact,
};

const YEAR_RULE: ColumnRule = ColumnRule {
    canonical: ANNO,
    sources: &["anno", "anno_rilevazione", "year"],
    kind: MatchKind::Exact,
};

const STAYS_RULES: [ColumnRule; 2] = [
    ColumnRule {
        canonical: PRESENZE,
        sources: &["presenze", "presences", "overnight_stays"],
        kind: MatchKind::Exact,
    },
    ColumnRule {
        canonical: PRESENZE,
        sources: &["totale_presenze"],
        kind: MatchKind::Contains,
    },
];

const ARRIVALS_RULES: [ColumnRule; 2] = [
    ColumnRule {
        canonical: ARRIVI,
        sources: &["arrivi", "arrivals"],
        kind: MatchKind::Exact,
    },
    ColumnRule {
        canonical: ARRIVI,
        sources: &["totale_arrivi"],
        kind: MatchKind::Contains,
    },
];

/// Municipal files: wide (`Comuni; Gen Presenze; ...`) or long (`comune; mese; presenze`).
pub static MUNICIPAL: DomainSchema = DomainSchema {
    name: "municipal",
    rules: &[
        ColumnRule {
            canonical: COMUNE,
            sources: &[
                "comune",
                "comuni",
                "denominazione_comune",
                "nome_comune",
                "denominazione",
            ],
            kind: MatchKind::Exact,
        },
        MONTH_RULE,
        YEAR_RULE,
        STAYS_RULES[0],
        STAYS_RULES[1],
    ],
    mandatory: &[COMUNE],
    leading_column: None,
};

/// Provincial and sub-zone files: one row per month.
pub static PROVINCIAL: DomainSchema = DomainSchema {
    name: "provincial",
    rules: &[
        MONTH_RULE,
        YEAR_RULE,
        ARRIVALS_RULES[0],
        ARRIVALS_RULES[1],
        STAYS_RULES[0],
        STAYS_RULES[1],
    ],
    mandatory: &[MESE, ARRIVI, PRESENZE],
    leading_column: None,
};

/// Country-of-origin files: one row per month, one column per country.
pub static COUNTRY: DomainSchema = DomainSchema {
    name: "country_of_origin",
    rules: &[MONTH_RULE, YEAR_RULE],
    mandatory: &[MESE],
    leading_column: Some(MESE),
};

/// Every built-in schema, checked when a pipeline is built.
pub fn builtin_schemas() -> [&'static DomainSchema; 3] {
    [&MUNICIPAL, &PROVINCIAL, &COUNTRY]
}

impl DomainSchema {
    /// Check that every mandatory column can be produced by some rule.
    pub fn validate(&self) -> Result<()> {
        for rule in self.rules {
            if rule.sources.is_empty() {
                return Err(EtlError::InvalidSchema {
                    schema: self.name.to_string(),
                    reason: format!("rule for '{}' has no source names", rule.canonical),
                });
            }
        }

        for column in self.mandatory {
            let covered = self.rules.iter().any(|rule| rule.canonical == *column)
                || self.leading_column == Some(*column);
            if !covered {
                return Err(EtlError::InvalidSchema {
                    schema: self.name.to_string(),
                    reason: format!("mandatory column '{column}' has no rule"),
                });
            }
        }
        Ok(())
    }

    /// Canonical names for a header row, in column order.
    ///
    /// Columns no rule claims keep their normalized name. When two columns
    /// match the same canonical name only the first one gets it.
    pub fn map_columns(&self, headers: &[String]) -> Vec<String> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();
        let mut mapped: Vec<Option<&'static str>> = vec![None; headers.len()];

        for rule in self.rules {
            if mapped.contains(&Some(rule.canonical)) {
                continue;
            }
            let target = normalized
                .iter()
                .enumerate()
                .find(|(i, name)| mapped[*i].is_none() && rule.matches(name));
            if let Some((i, _)) = target {
                mapped[i] = Some(rule.canonical);
            }
        }

        if let Some(leading) = self.leading_column
            && !mapped.contains(&Some(leading))
            && mapped.first() == Some(&None)
        {
            mapped[0] = Some(leading);
        }

        normalized
            .into_iter()
            .zip(mapped)
            .map(|(name, canonical)| canonical.map(str::to_string).unwrap_or(name))
            .collect()
    }

    /// Normalize a raw table: canonical columns, mandatory check, year per row.
    pub fn normalize(
        &self,
        raw: RawTable,
        file_name: &str,
    ) -> std::result::Result<NormalizedTable, SkipReason> {
        let columns = self.map_columns(&raw.headers);

        let missing: Vec<String> = self
            .mandatory
            .iter()
            .filter(|column| !columns.iter().any(|c| c == *column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SkipReason::MissingColumns {
                missing,
                found: columns,
            });
        }

        let years = match year_from_file_name(file_name) {
            Some(year) => vec![Some(year); raw.rows.len()],
            None => match columns.iter().position(|c| c == ANNO) {
                Some(index) => raw
                    .rows
                    .iter()
                    .map(|row| year_from_cell(&row[index]))
                    .collect(),
                None => return Err(SkipReason::NoYear),
            },
        };
        if years.iter().all(Option::is_none) {
            return Err(SkipReason::NoYear);
        }

        debug!(schema = self.name, file = file_name, ?columns, "Normalized columns");

        Ok(NormalizedTable {
            columns,
            source_columns: raw.headers,
            rows: raw.rows,
            years,
        })
    }
}

/// A raw table with canonical column names and a year per row.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    /// Header cells as they appeared in the file.
    pub source_columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Reporting year of each row; `None` rows are dropped downstream.
    pub years: Vec<Option<i32>>,
}

impl NormalizedTable {
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rename a column, e.g. to treat an unnamed leading column as the entity.
    pub fn rename(&mut self, index: usize, name: &str) {
        if let Some(column) = self.columns.get_mut(index) {
            *column = name.to_string();
        }
    }
}
