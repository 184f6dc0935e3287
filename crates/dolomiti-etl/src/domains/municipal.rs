use super::{DomainLoad, FileRows, load_domain, locate, process_file};
use crate::canonical::{canonicalize_month, clean_entity_name, is_total_label};
use crate::config::EtlConfig;
use crate::diagnostics::{Diagnostic, SkipReason};
use crate::reader::RawTable;
use crate::reshape::melt_months;
use crate::schema::{COMUNE, MESE, MUNICIPAL, NormalizedTable, PRESENZE};
use crate::types::{Domain, Month, MonthlyRecord};
use std::collections::BTreeSet;
use std::path::Path;

/// Words marking month columns of another metric in the wide layout.
const OTHER_METRICS: [&str; 2] = ["arrivi", "arrivals"];

/// Load every municipal file under the configured roots.
pub fn load_municipal(config: &EtlConfig) -> DomainLoad<MonthlyRecord> {
    let files = locate(
        Domain::Municipal,
        &config.municipal_pattern,
        &config.roots,
        config.recursive,
    );
    load_domain(Domain::Municipal, files, &config.read_options(0), extract)
}

/// Process a single municipal file.
pub fn process_municipal_file(path: &Path, config: &EtlConfig) -> (Vec<MonthlyRecord>, Diagnostic) {
    process_file(Domain::Municipal, path, &config.read_options(0), extract)
}

fn extract(raw: RawTable, file_name: &str) -> Result<FileRows<MonthlyRecord>, SkipReason> {
    let table = MUNICIPAL.normalize(raw, file_name)?;
    if table.has(MESE) && table.has(PRESENZE) {
        Ok(extract_long(&table))
    } else {
        extract_wide(&table)
    }
}

/// Wide layout: one row per municipality, one column per month.
fn extract_wide(table: &NormalizedTable) -> Result<FileRows<MonthlyRecord>, SkipReason> {
    let long = melt_months(table, &OTHER_METRICS)?;
    let mut out = FileRows::default();
    let mut used = BTreeSet::new();

    for row in &long.rows {
        let name = long.id(row, COMUNE).unwrap_or_default();
        let value = out.coerced.coerce(&row.value);
        if let Some(record) = record(row.year, canonicalize_month(&row.variable), name, value) {
            used.insert(row.source_row);
            out.push(record);
        }
    }

    out.count_unused_rows(table.len(), &used);
    Ok(out)
}

/// Long layout: `comune; mese; presenze`.
fn extract_long(table: &NormalizedTable) -> FileRows<MonthlyRecord> {
    let mut out = FileRows::default();
    let (Some(name_col), Some(month_col), Some(value_col)) = (
        table.index_of(COMUNE),
        table.index_of(MESE),
        table.index_of(PRESENZE),
    ) else {
        return out;
    };

    for (row, year) in table.rows.iter().zip(&table.years) {
        let month = canonicalize_month(&row[month_col]);
        let value = out.coerced.coerce(&row[value_col]);
        match record(*year, month, &row[name_col], value) {
            Some(record) => out.push(record),
            None => out.drop_row(),
        }
    }

    out
}

/// A record, or `None` when the year, the month or the municipality is unusable.
fn record(year: Option<i32>, month: Option<Month>, raw_name: &str, value: f64) -> Option<MonthlyRecord> {
    let municipality = clean_entity_name(raw_name);
    if municipality.is_empty() || is_total_label(&municipality) {
        return None;
    }
    Some(MonthlyRecord {
        year: year?,
        month: month?,
        municipality,
        overnight_stays: value,
    })
}
