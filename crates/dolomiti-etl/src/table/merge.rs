//! Merging per-file results into one domain table.

use super::{Record, Table};
use tracing::{debug, warn};

/// Concatenate per-file rows into one sorted table.
///
/// Rows with a blank key field are dropped. Rows sharing a key are all kept;
/// a warning names how many keys are duplicated. The result does not depend
/// on the order of `parts`.
pub fn merge<R: Record>(domain: &str, parts: Vec<Vec<R>>) -> Table<R> {
    let total: usize = parts.iter().map(Vec::len).sum();
    let rows: Vec<R> = parts
        .into_iter()
        .flatten()
        .filter(Record::has_key)
        .collect();

    if rows.len() < total {
        debug!(domain, dropped = total - rows.len(), "Dropped keyless rows");
    }

    let table = Table::from_rows(rows);

    let duplicates = table.duplicate_keys();
    if !duplicates.is_empty() {
        warn!(
            domain,
            keys = duplicates.len(),
            first = ?duplicates[0].0,
            "Duplicate keys across source rows, all rows retained"
        );
    }

    table
}
