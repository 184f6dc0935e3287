use super::{DomainLoad, FileRows, load_domain, locate, process_file};
use crate::canonical::{canonicalize_month, clean_entity_name, is_aggregate_bucket};
use crate::config::EtlConfig;
use crate::diagnostics::{Diagnostic, SkipReason};
use crate::reader::RawTable;
use crate::reshape::melt_columns;
use crate::schema::{COUNTRY, MESE};
use crate::types::{CountryOriginRecord, Domain};
use std::collections::BTreeSet;
use std::path::Path;

/// Load every country-of-origin file under the configured roots.
pub fn load_country_origin(config: &EtlConfig) -> DomainLoad<CountryOriginRecord> {
    let files = locate(
        Domain::CountryOfOrigin,
        &config.country_pattern,
        &config.roots,
        config.recursive,
    );
    load_domain(
        Domain::CountryOfOrigin,
        files,
        &config.read_options(config.country_header_line),
        extract,
    )
}

/// Process a single country-of-origin file.
pub fn process_country_file(
    path: &Path,
    config: &EtlConfig,
) -> (Vec<CountryOriginRecord>, Diagnostic) {
    process_file(
        Domain::CountryOfOrigin,
        path,
        &config.read_options(config.country_header_line),
        extract,
    )
}

/// One row per month, one column per country; total columns are skipped.
fn extract(raw: RawTable, file_name: &str) -> Result<FileRows<CountryOriginRecord>, SkipReason> {
    let table = COUNTRY.normalize(raw, file_name)?;
    let long = melt_columns(&table, MESE);
    let mut out = FileRows::default();
    let mut used = BTreeSet::new();

    for row in &long.rows {
        let value = out.coerced.coerce(&row.value);
        let month = long.id(row, MESE).and_then(canonicalize_month);
        let country = clean_entity_name(&row.variable);

        let (Some(year), Some(month)) = (row.year, month) else {
            continue;
        };
        if country.is_empty() {
            continue;
        }

        used.insert(row.source_row);
        out.push(CountryOriginRecord {
            year,
            month,
            is_aggregate: is_aggregate_bucket(&country),
            country,
            overnight_stays: value,
        });
    }

    out.count_unused_rows(table.len(), &used);
    Ok(out)
}
