//! Integration tests for the ETL pipeline.
//!
//! These tests run the loaders end to end over the fixture tree and over
//! temporary directories.

use dolomiti_etl::{
    Diagnostic, DomainKind, EtlConfig, EtlOutput, EtlPipeline, Filter, Metric, Month,
    MonthlyRecord, Outcome, Record, SkipReason, SubZone, TextEncoding, annual_totals,
    domains::process_municipal_file, load_municipal, load_subzone,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dati")
}

fn run_on(roots: &[&Path]) -> EtlOutput {
    let config = EtlConfig::builder()
        .roots(roots.iter().copied())
        .build()
        .expect("valid config");
    EtlPipeline::builder()
        .config(config)
        .build()
        .expect("valid pipeline")
        .run()
}

fn diagnostic_for<'a>(output: &'a EtlOutput, file_name: &str) -> &'a Diagnostic {
    output
        .diagnostics
        .iter()
        .find(|d| d.path.file_name().is_some_and(|n| n == file_name))
        .unwrap_or_else(|| panic!("no diagnostic for {file_name}"))
}

fn stays(output: &EtlOutput, municipality: &str, year: i32, month: Month) -> Option<f64> {
    output
        .municipal
        .iter()
        .find(|r| r.municipality == municipality && r.year == year && r.month == month)
        .map(|r| r.overnight_stays)
}

// ============================================================================
// Full Run over the Fixture Tree
// ============================================================================

#[test]
fn test_full_run_on_fixtures() {
    let output = run_on(&[&fixtures_path()]);

    assert_eq!(output.municipal.len(), 10);
    assert_eq!(output.provincial.len(), 2);
    assert_eq!(output.stl_dolomiti.len(), 2);
    assert_eq!(output.stl_belluno.len(), 2);
    assert_eq!(output.country_origin.len(), 6);

    let summary = output.summary();
    assert_eq!(summary.total_rows, 22);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.files_accepted, 6);
}

#[test]
fn test_municipal_fixture_values() {
    let output = run_on(&[&fixtures_path()]);

    assert_eq!(stays(&output, "Belluno", 2023, Month::Feb), Some(200.0));
    assert_eq!(stays(&output, "Cortina d'Ampezzo", 2023, Month::Gen), Some(5000.0));
    // "n.d." and blank cells become zero
    assert_eq!(stays(&output, "Cortina d'Ampezzo", 2023, Month::Mar), Some(0.0));
    assert_eq!(stays(&output, "Feltre", 2022, Month::Feb), Some(0.0));
    // Latin-1 file
    assert_eq!(stays(&output, "San Nicolò di Comelico", 2022, Month::Gen), Some(30.0));

    assert!(output.municipal.iter().all(|r| r.municipality != "Totale"));
    assert_eq!(output.municipal.years(), vec![2022, 2023]);
}

#[test]
fn test_fixture_diagnostics() {
    let output = run_on(&[&fixtures_path()]);

    let empty = diagnostic_for(&output, "turismo-per-mese-comune-2021.txt");
    assert_eq!(empty.skip_reason(), Some(&SkipReason::Empty));

    match &diagnostic_for(&output, "turismo-per-mese-comune-2022.txt").outcome {
        Outcome::Accepted {
            rows,
            encoding,
            coerced_cells,
            ..
        } => {
            assert_eq!(*rows, 4);
            assert_eq!(*encoding, TextEncoding::Latin1);
            assert_eq!(*coerced_cells, 1);
        }
        other => panic!("expected the Latin-1 file to be accepted, got {other:?}"),
    }

    match &diagnostic_for(&output, "turismo-per-mese-comune-2023.txt").outcome {
        Outcome::Accepted {
            rows, dropped_rows, ..
        } => {
            assert_eq!(*rows, 6);
            assert_eq!(*dropped_rows, 1);
        }
        other => panic!("expected the 2023 file to be accepted, got {other:?}"),
    }
}

#[test]
fn test_provincial_and_subzone_fixtures() {
    let output = run_on(&[&fixtures_path()]);

    let january = &output.provincial.rows()[0];
    assert_eq!(january.month, Month::Gen);
    assert_eq!(january.arrivals, 100_000.0);
    assert_eq!(january.overnight_stays, 500_000.0);

    // comma- and tab-separated files
    assert!(output.stl_dolomiti.iter().all(|r| r.zone == SubZone::Dolomiti));
    assert_eq!(output.stl_dolomiti.rows()[1].overnight_stays, 200.0);
    assert!(output.stl_belluno.iter().all(|r| r.zone == SubZone::Belluno));
    assert_eq!(output.stl_belluno.rows()[0].arrivals, 1.0);

    let totals = annual_totals(&output.provincial, Metric::Arrivals);
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].value, 220_000.0);
}

#[test]
fn test_country_fixture() {
    let output = run_on(&[&fixtures_path()]);

    let countries = output.country_origin.entities();
    assert_eq!(countries, vec!["Altri Paesi", "Austria", "Germania"]);

    let named = Filter::new().exclude_aggregates().apply(&output.country_origin);
    assert_eq!(named.len(), 4);

    let germany_jan = output
        .country_origin
        .iter()
        .find(|r| r.country == "Germania" && r.month == Month::Gen)
        .unwrap();
    assert_eq!(germany_jan.overnight_stays, 1000.0);
}

#[test]
fn test_export_fixtures_to_csv() {
    let output = run_on(&[&fixtures_path()]);
    let dir = tempfile::tempdir().unwrap();

    let written = output.export_csv(dir.path()).unwrap();
    assert_eq!(written.len(), 5);

    let country = fs::read_to_string(dir.path().join("paesi_provenienza.csv")).unwrap();
    assert_eq!(country.lines().count(), 1 + 6);
}

// ============================================================================
// Empty and Degraded Inputs
// ============================================================================

#[test]
fn test_empty_directory_yields_typed_empty_frames() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_on(&[dir.path()]);

    assert!(output.is_empty());
    assert!(output.diagnostics.is_empty());

    let frames = output.dataframes().unwrap();
    assert_eq!(frames.len(), 5);
    for (name, df) in &frames {
        assert_eq!(df.height(), 0, "{name} should be empty");
    }

    let municipal = &frames[0].1;
    let names: Vec<&str> = municipal
        .get_column_names()
        .iter()
        .map(|n| n.as_str())
        .collect();
    assert_eq!(names, MonthlyRecord::COLUMNS);
    assert_eq!(municipal.column("anno").unwrap().dtype(), &DataType::Int32);
    assert_eq!(municipal.column("presenze").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_missing_root_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_on(&[&dir.path().join("does-not-exist")]);
    assert!(output.is_empty());
}

#[test]
fn test_corrupted_file_beside_valid_ones() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("turismo-per-mese-comune-2022.txt"),
        "Comuni;Gen Presenze\nFeltre;10\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("turismo-per-mese-comune-2023.txt"),
        "Comuni;Gen Presenze\nFeltre;20\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("turismo-per-mese-comune-2024.txt"),
        "this is not a table\nat all\n",
    )
    .unwrap();

    let load = load_municipal(&EtlConfig::builder().root(dir.path()).build().unwrap());

    assert_eq!(load.table.len(), 2);
    let skipped: Vec<&Diagnostic> = load.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].path.ends_with("turismo-per-mese-comune-2024.txt"));
    assert!(matches!(
        skipped[0].skip_reason(),
        Some(SkipReason::Unreadable { .. })
    ));
}

#[test]
fn test_file_without_year_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("turismo-per-mese-comune.txt"),
        "Comuni;Gen Presenze\nFeltre;10\n",
    )
    .unwrap();

    let load = load_municipal(&EtlConfig::builder().root(dir.path()).build().unwrap());
    assert!(load.table.is_empty());
    assert_eq!(
        load.diagnostics[0].skip_reason(),
        Some(&SkipReason::NoYear)
    );
}

// ============================================================================
// Encodings, Ordering and Layout
// ============================================================================

#[test]
fn test_utf8_and_latin1_files_are_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    let text = "Comuni;Gen Presenze;Feb Presenze\nSan Nicolò di Comelico;30;40\n";

    let utf8_path = dir.path().join("utf8").join("turismo-per-mese-comune-2022.txt");
    let latin1_path = dir.path().join("latin1").join("turismo-per-mese-comune-2022.txt");
    fs::create_dir_all(utf8_path.parent().unwrap()).unwrap();
    fs::create_dir_all(latin1_path.parent().unwrap()).unwrap();

    fs::write(&utf8_path, text.as_bytes()).unwrap();
    let latin1: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
    fs::write(&latin1_path, latin1).unwrap();

    let config = EtlConfig::default();
    let (utf8_rows, utf8_diag) = process_municipal_file(&utf8_path, &config);
    let (latin1_rows, latin1_diag) = process_municipal_file(&latin1_path, &config);

    assert!(utf8_diag.is_accepted());
    assert!(latin1_diag.is_accepted());
    assert_eq!(utf8_rows, latin1_rows);
    assert_eq!(utf8_rows[0].municipality, "San Nicolò di Comelico");
}

#[test]
fn test_merge_is_independent_of_root_order() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    fs::write(
        a.path().join("turismo-per-mese-comune-2023.txt"),
        "Comuni;Gen Presenze;Feb Presenze\nFeltre;1;2\nBelluno;3;4\n",
    )
    .unwrap();
    fs::write(
        b.path().join("turismo-per-mese-comune-2022.txt"),
        "Comuni;Gen Presenze;Feb Presenze\nAgordo;5;6\nFeltre;7;8\n",
    )
    .unwrap();

    let forward = run_on(&[a.path(), b.path()]);
    let backward = run_on(&[b.path(), a.path()]);

    assert_eq!(forward.municipal, backward.municipal);
    assert_eq!(forward.municipal.len(), 8);

    let first = &forward.municipal.rows()[0];
    assert_eq!((first.year, first.month), (2022, Month::Gen));
}

#[test]
fn test_months_are_in_calendar_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("presenze-arrivi-provincia-belluno-2023.txt"),
        "Mese;Arrivi;Presenze\nDicembre;1;1\nagosto;1;1\nGEN;1;1\n",
    )
    .unwrap();

    let output = run_on(&[dir.path()]);
    let months: Vec<Month> = output.provincial.iter().map(|r| r.month).collect();
    assert_eq!(months, vec![Month::Gen, Month::Ago, Month::Dic]);

    let df = output.provincial.to_dataframe().unwrap();
    let numbers: Vec<Option<u32>> = df
        .column("mese_num")
        .unwrap()
        .u32()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(numbers, vec![Some(1), Some(8), Some(12)]);
}

#[test]
fn test_subzone_folders_without_recursion() {
    let dir = tempfile::tempdir().unwrap();
    let zone_dir = dir.path().join("stl-dolomiti");
    fs::create_dir_all(&zone_dir).unwrap();
    fs::write(
        zone_dir.join("stl-2023.txt"),
        "Mese;Arrivi;Presenze\nGennaio;1;2\n",
    )
    .unwrap();

    let config = EtlConfig::builder()
        .root(dir.path())
        .recursive(false)
        .build()
        .unwrap();

    assert_eq!(load_subzone(&config, SubZone::Dolomiti).table.len(), 1);
    assert!(load_subzone(&config, SubZone::Belluno).table.is_empty());
}

#[test]
fn test_subzone_folder_above_the_root_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("stl-belluno").join("archivio");
    let zone_dir = root.join("stl-dolomiti");
    fs::create_dir_all(&zone_dir).unwrap();
    fs::write(
        zone_dir.join("presenze-2023.txt"),
        "Mese;Arrivi;Presenze\nGennaio;1;2\n",
    )
    .unwrap();

    let config = EtlConfig::builder().root(&root).build().unwrap();

    assert_eq!(load_subzone(&config, SubZone::Dolomiti).table.len(), 1);
    assert!(load_subzone(&config, SubZone::Belluno).table.is_empty());
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn test_diagnostic_callback_and_domain_selection() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    let output = EtlPipeline::builder()
        .config(EtlConfig::builder().root(fixtures_path()).build().unwrap())
        .domains([DomainKind::Municipal])
        .on_diagnostic(move |d| {
            seen_clone.lock().unwrap().push(d.is_accepted());
        })
        .build()
        .unwrap()
        .run();

    assert_eq!(output.municipal.len(), 10);
    assert!(output.provincial.is_empty());
    assert!(output.country_origin.is_empty());

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec![false, true, true]);
}

#[test]
fn test_diagnostics_serialize_to_json() {
    let output = run_on(&[&fixtures_path()]);
    let skipped: Vec<&Diagnostic> = output.skipped().collect();
    let json = serde_json::to_value(&skipped).unwrap();

    assert_eq!(json[0]["outcome"]["status"], "skipped");
    assert_eq!(json[0]["outcome"]["reason"]["kind"], "empty");
}
