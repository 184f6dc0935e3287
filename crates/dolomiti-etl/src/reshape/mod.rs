//! Wide to long reshaping.
//!
//! Municipal files carry one column per month (`Gen Presenze`, `Feb Presenze`,
//! ...), country files one column per country. Melting turns every
//! (row, value column) pair into one long row, keeping the identifier cells.

use crate::canonical::{is_total_label, month_token};
use crate::diagnostics::SkipReason;
use crate::schema::{ANNO, NormalizedTable};
use crate::utils::alphabetic_words;

/// One cell of a wide table, lifted into a long row.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    /// Index of the wide row this cell came from.
    pub source_row: usize,
    pub year: Option<i32>,
    /// Identifier cells, aligned with [`LongTable::id_columns`].
    pub ids: Vec<String>,
    /// Month token for month melts, source header for column melts.
    pub variable: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    pub id_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<LongRow>,
}

impl LongTable {
    /// Identifier cell of a long row by canonical column name.
    pub fn id<'a>(&self, row: &'a LongRow, column: &str) -> Option<&'a str> {
        let index = self.id_columns.iter().position(|c| c == column)?;
        row.ids.get(index).map(String::as_str)
    }
}

/// Melt the month columns of a wide table.
///
/// Value columns are the columns whose header holds a month word. A month
/// column that also names one of `other_metrics` (e.g. `Gen Arrivi` while
/// loading stays) is ignored entirely. Every other column is an identifier.
pub fn melt_months(
    table: &NormalizedTable,
    other_metrics: &[&str],
) -> Result<LongTable, SkipReason> {
    let mut values: Vec<(usize, String)> = Vec::new();
    let mut ids: Vec<usize> = Vec::new();

    for (index, header) in table.source_columns.iter().enumerate() {
        match month_token(header) {
            Some((token, _)) => {
                let words = alphabetic_words(header);
                if !words.iter().any(|w| other_metrics.contains(&w.as_str())) {
                    values.push((index, token));
                }
            }
            None => ids.push(index),
        }
    }

    if values.is_empty() {
        return Err(SkipReason::NoMonthColumns);
    }

    Ok(melt(table, &ids, &values))
}

/// Melt every column except `id_column` and the year column.
///
/// Blank headers and total columns (`Totale`, `Total`) are skipped. The
/// variable of each long row is the header as written in the file.
pub fn melt_columns(table: &NormalizedTable, id_column: &str) -> LongTable {
    let mut values: Vec<(usize, String)> = Vec::new();
    let mut ids: Vec<usize> = Vec::new();

    for (index, (column, header)) in table
        .columns
        .iter()
        .zip(&table.source_columns)
        .enumerate()
    {
        if column == id_column || column == ANNO {
            ids.push(index);
        } else if !header.trim().is_empty() && !is_total_label(header) {
            values.push((index, header.trim().to_string()));
        }
    }

    melt(table, &ids, &values)
}

fn melt(table: &NormalizedTable, ids: &[usize], values: &[(usize, String)]) -> LongTable {
    let mut rows = Vec::with_capacity(table.rows.len() * values.len());

    for (row_index, row) in table.rows.iter().enumerate() {
        let id_cells: Vec<String> = ids.iter().map(|&i| row[i].clone()).collect();
        let year = table.years.get(row_index).copied().flatten();
        for (column, variable) in values {
            rows.push(LongRow {
                source_row: row_index,
                year,
                ids: id_cells.clone(),
                variable: variable.clone(),
                value: row[*column].clone(),
            });
        }
    }

    LongTable {
        id_columns: ids.iter().map(|&i| table.columns[i].clone()).collect(),
        value_columns: values.iter().map(|(i, _)| table.columns[*i].clone()).collect(),
        rows,
    }
}
