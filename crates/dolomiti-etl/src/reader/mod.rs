//! Raw table reader.
//!
//! Decodes a delimited text file by trying an ordered list of
//! (encoding, delimiter) candidates. The first combination whose header row
//! has enough non-blank columns wins. Files that cannot be read never raise:
//! they come back as [`ReadOutcome::Empty`] or [`ReadOutcome::Unreadable`].

use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::utils::BOM;

/// Text encodings the reader can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// Strict UTF-8: any invalid sequence rejects the candidate.
    Utf8,
    /// Latin-1, decoded as Windows-1252. Never fails.
    Latin1,
}

impl TextEncoding {
    pub const DEFAULT_ORDER: [TextEncoding; 2] = [TextEncoding::Utf8, TextEncoding::Latin1];

    /// Decode `bytes`, or `None` when they are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        let decoded = match self {
            Self::Utf8 => UTF_8
                .decode_without_bom_handling_and_without_replacement(bytes)?
                .into_owned(),
            Self::Latin1 => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
        };
        Some(match decoded.strip_prefix(BOM) {
            Some(rest) => rest.to_string(),
            None => decoded,
        })
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Latin1 => f.write_str("Latin-1"),
        }
    }
}

/// Field delimiters the reader can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Semicolon,
    Comma,
    Tab,
}

impl Delimiter {
    pub const DEFAULT_ORDER: [Delimiter; 3] =
        [Delimiter::Semicolon, Delimiter::Comma, Delimiter::Tab];

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Semicolon => b';',
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semicolon => f.write_str("';'"),
            Self::Comma => f.write_str("','"),
            Self::Tab => f.write_str("TAB"),
        }
    }
}

/// Options for one read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub encodings: Vec<TextEncoding>,
    pub delimiters: Vec<Delimiter>,
    /// Minimum number of non-blank header columns.
    pub min_columns: usize,
    /// Zero-based line of the header; earlier lines are titles.
    pub header_line: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            encodings: TextEncoding::DEFAULT_ORDER.to_vec(),
            delimiters: Delimiter::DEFAULT_ORDER.to_vec(),
            min_columns: 2,
            header_line: 0,
        }
    }
}

/// An untyped table: header cells and data rows, all as text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells wide.
    pub rows: Vec<Vec<String>>,
    pub encoding: TextEncoding,
    pub delimiter: Delimiter,
}

impl RawTable {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Result of reading one file.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Table(RawTable),
    /// Zero bytes, or a header with no data rows.
    Empty,
    /// No candidate combination produced a plausible table.
    Unreadable(String),
}

/// Read and decode one file.
pub fn read_raw_table(path: &Path, options: &ReadOptions) -> ReadOutcome {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return ReadOutcome::Unreadable(format!("cannot open file: {e}")),
    };

    let outcome = parse_raw_table(&bytes, options);
    match &outcome {
        ReadOutcome::Table(table) => debug!(
            path = %path.display(),
            encoding = %table.encoding,
            delimiter = %table.delimiter,
            columns = table.width(),
            rows = table.rows.len(),
            "Decoded file"
        ),
        ReadOutcome::Empty => debug!(path = %path.display(), "File is empty"),
        ReadOutcome::Unreadable(detail) => {
            debug!(path = %path.display(), detail = %detail, "File is unreadable")
        }
    }
    outcome
}

/// Decode an in-memory file.
pub fn parse_raw_table(bytes: &[u8], options: &ReadOptions) -> ReadOutcome {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return ReadOutcome::Empty;
    }

    let mut saw_header_only = false;

    for &encoding in &options.encodings {
        let Some(text) = encoding.decode(bytes) else {
            continue;
        };

        for &delimiter in &options.delimiters {
            match try_parse(&text, delimiter, options) {
                Some((headers, rows)) if rows.is_empty() => {
                    saw_header_only = true;
                    debug!(%encoding, %delimiter, columns = headers.len(), "Header without data rows");
                }
                Some((headers, rows)) => {
                    return ReadOutcome::Table(RawTable {
                        headers,
                        rows,
                        encoding,
                        delimiter,
                    });
                }
                None => {}
            }
        }
    }

    if saw_header_only {
        ReadOutcome::Empty
    } else {
        ReadOutcome::Unreadable(format!(
            "no encoding/delimiter combination yields at least {} columns",
            options.min_columns
        ))
    }
}

/// Parse decoded text with one delimiter; `None` when the header is too narrow.
fn try_parse(
    text: &str,
    delimiter: Delimiter,
    options: &ReadOptions,
) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter.as_byte())
        .from_reader(text.as_bytes());

    let mut records = reader
        .records()
        .filter_map(|record| record.ok())
        .skip(options.header_line);

    let header_record = records.next()?;
    let mut headers: Vec<String> = header_record.iter().map(str::to_string).collect();

    // trailing delimiters leave blank header cells
    while headers.last().is_some_and(|h| h.trim().is_empty()) {
        headers.pop();
    }

    let non_blank = headers.iter().filter(|h| !h.trim().is_empty()).count();
    if non_blank < options.min_columns.max(1) {
        return None;
    }

    let width = headers.len();
    let rows = records
        .map(|record| {
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            row.resize(width, String::new());
            row
        })
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    Some((headers, rows))
}
