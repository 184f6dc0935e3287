use super::{DomainLoad, FileRows, load_domain, locate, process_file};
use crate::canonical::canonicalize_month;
use crate::config::EtlConfig;
use crate::diagnostics::{Diagnostic, SkipReason};
use crate::reader::RawTable;
use crate::schema::{ARRIVI, MESE, PRESENZE, PROVINCIAL};
use crate::types::{Domain, Month, ProvincialRecord};
use std::path::Path;

/// One month of arrivals and stays, shared by the provincial and sub-zone files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MonthlyTotals {
    pub year: i32,
    pub month: Month,
    pub arrivals: f64,
    pub overnight_stays: f64,
}

/// Extract monthly totals from a one-row-per-month table.
///
/// Subtotal rows (`Totale`) have no canonical month and are dropped.
pub(crate) fn extract_totals(
    raw: RawTable,
    file_name: &str,
) -> Result<FileRows<MonthlyTotals>, SkipReason> {
    let table = PROVINCIAL.normalize(raw, file_name)?;
    let mut out = FileRows::default();

    let (Some(month_col), Some(arrivals_col), Some(stays_col)) = (
        table.index_of(MESE),
        table.index_of(ARRIVI),
        table.index_of(PRESENZE),
    ) else {
        return Ok(out);
    };

    for (row, year) in table.rows.iter().zip(&table.years) {
        let (Some(year), Some(month)) = (*year, canonicalize_month(&row[month_col])) else {
            out.drop_row();
            continue;
        };
        let arrivals = out.coerced.coerce(&row[arrivals_col]);
        let overnight_stays = out.coerced.coerce(&row[stays_col]);
        out.push(MonthlyTotals {
            year,
            month,
            arrivals,
            overnight_stays,
        });
    }

    Ok(out)
}

/// Load every provincial file under the configured roots.
pub fn load_provincial(config: &EtlConfig) -> DomainLoad<ProvincialRecord> {
    let files = locate(
        Domain::Provincial,
        &config.provincial_pattern,
        &config.roots,
        config.recursive,
    );
    load_domain(Domain::Provincial, files, &config.read_options(0), extract)
}

/// Process a single provincial file.
pub fn process_provincial_file(
    path: &Path,
    config: &EtlConfig,
) -> (Vec<ProvincialRecord>, Diagnostic) {
    process_file(Domain::Provincial, path, &config.read_options(0), extract)
}

fn extract(raw: RawTable, file_name: &str) -> Result<FileRows<ProvincialRecord>, SkipReason> {
    let totals = extract_totals(raw, file_name)?;
    Ok(FileRows {
        rows: totals
            .rows
            .into_iter()
            .map(|t| ProvincialRecord {
                year: t.year,
                month: t.month,
                arrivals: t.arrivals,
                overnight_stays: t.overnight_stays,
            })
            .collect(),
        dropped_rows: totals.dropped_rows,
        coerced: totals.coerced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{ReadOptions, ReadOutcome, parse_raw_table};

    fn raw(text: &str) -> RawTable {
        match parse_raw_table(text.as_bytes(), &ReadOptions::default()) {
            ReadOutcome::Table(table) => table,
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn test_totale_row_never_appears() {
        let out = extract(
            raw("Mese;Totale Arrivi;Totale Presenze\nGennaio;100;1000\nFebbraio;200;2000\nTotale;999;9999\n"),
            "presenze-arrivi-provincia-belluno-2023.txt",
        )
        .unwrap();

        assert_eq!(out.rows.len(), 2);
        assert!(out.rows.iter().all(|r| r.arrivals != 999.0));
        assert_eq!(out.dropped_rows, 1);
        assert_eq!(out.rows[1].month, Month::Feb);
        assert_eq!(out.rows[1].overnight_stays, 2000.0);
    }

    #[test]
    fn test_year_from_column() {
        let out = extract(
            raw("Anno;Mese;Arrivi;Presenze\n2019;Gen;1.234;5.678\n2020;Gen;1;2\n"),
            "presenze-arrivi-provincia-belluno.txt",
        )
        .unwrap();
        let years: Vec<i32> = out.rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020]);
        assert_eq!(out.rows[0].arrivals, 1234.0);
    }

    #[test]
    fn test_negative_values_are_coerced() {
        let out = extract(
            raw("Mese;Arrivi;Presenze\nMarzo;-5;abc\n"),
            "presenze-arrivi-provincia-belluno-2023.txt",
        )
        .unwrap();
        assert_eq!(out.rows[0].arrivals, 0.0);
        assert_eq!(out.rows[0].overnight_stays, 0.0);
        assert_eq!(out.coerced.coerced, 2);
    }

    #[test]
    fn test_missing_arrivals_rejected() {
        let reason = extract(
            raw("Mese;Presenze\nGennaio;1\n"),
            "presenze-arrivi-provincia-belluno-2023.txt",
        )
        .unwrap_err();
        assert!(matches!(reason, SkipReason::MissingColumns { .. }));
    }
}
