//! Domain loaders.
//!
//! Each domain runs the same chain over its files: locate, read, normalize
//! the schema, reshape when wide, canonicalize months and values, merge. A
//! file that fails at any step becomes a skipped [`Diagnostic`] and the other
//! files carry on. A domain without usable files yields an empty table.

mod country;
mod municipal;
mod provincial;
mod subzone;

pub use country::{load_country_origin, process_country_file};
pub use municipal::{load_municipal, process_municipal_file};
pub use provincial::{load_provincial, process_provincial_file};
pub use subzone::{load_subzone, process_subzone_file};

use crate::canonical::CoercionCounter;
use crate::diagnostics::{Diagnostic, Outcome, SkipReason};
use crate::locator::{FileLocator, FilePattern};
use crate::reader::{RawTable, ReadOptions, ReadOutcome, read_raw_table};
use crate::table::{Record, Table, merge};
use crate::types::Domain;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A domain table with the diagnostics of every file that was considered.
#[derive(Debug, Clone)]
pub struct DomainLoad<R> {
    pub table: Table<R>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<R: Record> DomainLoad<R> {
    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_accepted())
    }
}

/// Records extracted from one file, with its data-quality counters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileRows<R> {
    pub rows: Vec<R>,
    pub dropped_rows: usize,
    pub coerced: CoercionCounter,
}

impl<R> Default for FileRows<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            dropped_rows: 0,
            coerced: CoercionCounter::default(),
        }
    }
}

impl<R> FileRows<R> {
    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn drop_row(&mut self) {
        self.dropped_rows += 1;
    }

    /// Count the source rows of a melted table that produced no record.
    ///
    /// A wide row melts into one cell per value column; it counts once.
    pub fn count_unused_rows(&mut self, source_rows: usize, used: &BTreeSet<usize>) {
        self.dropped_rows = source_rows.saturating_sub(used.len());
    }
}

/// Bare file name used for year inference.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Locate the files of a domain; an unparseable pattern finds nothing.
pub(crate) fn locate(domain: Domain, pattern: &str, roots: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    match FilePattern::parse(pattern) {
        Ok(pattern) => FileLocator::new(pattern).locate(roots, recursive),
        Err(e) => {
            warn!(%domain, error = %e, "Invalid file pattern, no files located");
            Vec::new()
        }
    }
}

/// Read one file and run the domain-specific extraction on it.
pub(crate) fn process_file<R, F>(
    domain: Domain,
    path: &Path,
    options: &ReadOptions,
    extract: F,
) -> (Vec<R>, Diagnostic)
where
    F: Fn(RawTable, &str) -> Result<FileRows<R>, SkipReason>,
{
    let raw = match read_raw_table(path, options) {
        ReadOutcome::Table(raw) => raw,
        ReadOutcome::Empty => {
            return (Vec::new(), Diagnostic::skipped(path, domain, SkipReason::Empty));
        }
        ReadOutcome::Unreadable(detail) => {
            return (
                Vec::new(),
                Diagnostic::skipped(path, domain, SkipReason::Unreadable { detail }),
            );
        }
    };

    let (encoding, delimiter) = (raw.encoding, raw.delimiter);
    match extract(raw, &file_name(path)) {
        Ok(file_rows) => {
            let diagnostic = Diagnostic {
                path: path.to_path_buf(),
                domain,
                outcome: Outcome::Accepted {
                    rows: file_rows.rows.len(),
                    dropped_rows: file_rows.dropped_rows,
                    coerced_cells: file_rows.coerced.coerced,
                    encoding,
                    delimiter,
                },
            };
            (file_rows.rows, diagnostic)
        }
        Err(reason) => (Vec::new(), Diagnostic::skipped(path, domain, reason)),
    }
}

/// Process every file of a domain in sequence and merge the results.
pub(crate) fn load_domain<R, F>(
    domain: Domain,
    files: Vec<PathBuf>,
    options: &ReadOptions,
    extract: F,
) -> DomainLoad<R>
where
    R: Record,
    F: Fn(RawTable, &str) -> Result<FileRows<R>, SkipReason>,
{
    if files.is_empty() {
        warn!(%domain, "No source files found");
    }

    let mut parts = Vec::with_capacity(files.len());
    let mut diagnostics = Vec::with_capacity(files.len());

    for path in &files {
        let (rows, diagnostic) = process_file(domain, path, options, &extract);
        diagnostic.emit();
        parts.push(rows);
        diagnostics.push(diagnostic);
    }

    let table = merge(domain.display_name(), parts);
    info!(
        %domain,
        files = files.len(),
        accepted = diagnostics.iter().filter(|d| d.is_accepted()).count(),
        rows = table.len(),
        "Domain loaded"
    );

    DomainLoad { table, diagnostics }
}
