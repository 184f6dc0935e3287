//! Structured per-file diagnostics.
//!
//! Every located file produces exactly one [`Diagnostic`]: accepted with its
//! row counts, or skipped with a [`SkipReason`]. Diagnostics are returned to
//! the caller and mirrored to `tracing`.

use crate::reader::{Delimiter, TextEncoding};
use crate::types::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Why a file contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("file is empty")]
    Empty,

    #[error("file is unreadable: {detail}")]
    Unreadable { detail: String },

    #[error("missing mandatory columns {missing:?} (found {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("no month columns to reshape")]
    NoMonthColumns,

    #[error("no reporting year in file name or 'anno' column")]
    NoYear,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Accepted {
        /// Records the file contributed.
        rows: usize,
        /// Rows dropped for a non-month label, a missing year or a blank entity.
        dropped_rows: usize,
        /// Metric cells coerced to zero.
        coerced_cells: usize,
        encoding: TextEncoding,
        delimiter: Delimiter,
    },
    Skipped {
        reason: SkipReason,
    },
}

/// The diagnostic of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub domain: Domain,
    pub outcome: Outcome,
}

impl Diagnostic {
    pub fn skipped(path: &Path, domain: Domain, reason: SkipReason) -> Self {
        Self {
            path: path.to_path_buf(),
            domain,
            outcome: Outcome::Skipped { reason },
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, Outcome::Accepted { .. })
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.outcome {
            Outcome::Skipped { reason } => Some(reason),
            Outcome::Accepted { .. } => None,
        }
    }

    /// Mirror the diagnostic to the log.
    pub fn emit(&self) {
        match &self.outcome {
            Outcome::Accepted {
                rows,
                dropped_rows,
                coerced_cells,
                encoding,
                delimiter,
            } => info!(
                domain = %self.domain,
                path = %self.path.display(),
                rows,
                dropped_rows,
                coerced_cells,
                %encoding,
                %delimiter,
                "Loaded file"
            ),
            Outcome::Skipped { reason } => warn!(
                domain = %self.domain,
                path = %self.path.display(),
                %reason,
                "Skipped file"
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Accepted {
                rows,
                dropped_rows,
                coerced_cells,
                ..
            } => write!(
                f,
                "[{}] {}: {} rows ({} dropped, {} cells coerced)",
                self.domain,
                self.path.display(),
                rows,
                dropped_rows,
                coerced_cells
            ),
            Outcome::Skipped { reason } => {
                write!(f, "[{}] {}: skipped, {}", self.domain, self.path.display(), reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubZone;

    #[test]
    fn test_skipped_diagnostic() {
        let diagnostic = Diagnostic::skipped(
            Path::new("/data/broken.txt"),
            Domain::Provincial,
            SkipReason::Empty,
        );
        assert!(!diagnostic.is_accepted());
        assert_eq!(diagnostic.skip_reason(), Some(&SkipReason::Empty));
        assert!(diagnostic.to_string().contains("broken.txt"));
    }

    #[test]
    fn test_missing_columns_message() {
        let reason = SkipReason::MissingColumns {
            missing: vec!["arrivi".to_string()],
            found: vec!["mese".to_string(), "presenze".to_string()],
        };
        let message = reason.to_string();
        assert!(message.contains("arrivi"));
        assert!(message.contains("presenze"));
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic {
            path: PathBuf::from("stl-belluno/presenze-2023.txt"),
            domain: Domain::SubZone(SubZone::Belluno),
            outcome: Outcome::Accepted {
                rows: 12,
                dropped_rows: 1,
                coerced_cells: 0,
                encoding: TextEncoding::Latin1,
                delimiter: Delimiter::Semicolon,
            },
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["outcome"]["status"], "accepted");
        assert_eq!(json["outcome"]["encoding"], "latin1");
        assert_eq!(json["domain"]["sub_zone"], "belluno");

        let skipped = Diagnostic::skipped(Path::new("x.txt"), Domain::Municipal, SkipReason::NoYear);
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["outcome"]["status"], "skipped");
        assert_eq!(json["outcome"]["reason"]["kind"], "no_year");
    }
}
