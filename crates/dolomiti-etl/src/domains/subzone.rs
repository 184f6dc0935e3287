use super::provincial::extract_totals;
use super::{DomainLoad, FileRows, load_domain, process_file};
use crate::config::EtlConfig;
use crate::diagnostics::{Diagnostic, SkipReason};
use crate::locator::{FileLocator, FilePattern};
use crate::reader::RawTable;
use crate::types::{Domain, SubZone, SubZoneRecord};
use std::path::{Path, PathBuf};
use tracing::warn;

fn folder(config: &EtlConfig, zone: SubZone) -> &str {
    match zone {
        SubZone::Dolomiti => &config.stl_dolomiti_folder,
        SubZone::Belluno => &config.stl_belluno_folder,
    }
}

fn locate_zone(config: &EtlConfig, zone: SubZone) -> Vec<PathBuf> {
    match FilePattern::parse(&config.subzone_pattern) {
        Ok(pattern) => FileLocator::new(pattern).find_in_folder(
            &config.roots,
            folder(config, zone),
            config.recursive,
        ),
        Err(e) => {
            warn!(zone = zone.display_name(), error = %e, "Invalid file pattern, no files located");
            Vec::new()
        }
    }
}

/// Load the files of one tourism zone (STL).
pub fn load_subzone(config: &EtlConfig, zone: SubZone) -> DomainLoad<SubZoneRecord> {
    let files = locate_zone(config, zone);
    load_domain(
        Domain::SubZone(zone),
        files,
        &config.read_options(0),
        |raw, file_name| extract(zone, raw, file_name),
    )
}

/// Process a single sub-zone file.
pub fn process_subzone_file(
    path: &Path,
    config: &EtlConfig,
    zone: SubZone,
) -> (Vec<SubZoneRecord>, Diagnostic) {
    process_file(
        Domain::SubZone(zone),
        path,
        &config.read_options(0),
        |raw, file_name| extract(zone, raw, file_name),
    )
}

fn extract(
    zone: SubZone,
    raw: RawTable,
    file_name: &str,
) -> Result<FileRows<SubZoneRecord>, SkipReason> {
    let totals = extract_totals(raw, file_name)?;
    Ok(FileRows {
        rows: totals
            .rows
            .into_iter()
            .map(|t| SubZoneRecord {
                zone,
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
