//! Source file discovery.
//!
//! Finds candidate files under the configured roots by file name pattern,
//! using `glob` with case-insensitive matching. A missing root is not an
//! error: it simply contributes no files.

use glob::{MatchOptions, Pattern, glob_with};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A glob pattern on bare file names (`*`, `?`, `[...]`).
///
/// Matching is case-insensitive and applies to the file name only.
///
/// ```rust,ignore
/// let pattern = FilePattern::parse("turismo-per-mese-comune*.txt")?;
/// assert!(pattern.matches("Turismo-per-mese-comune-2023.TXT"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    source: String,
    pattern: Pattern,
}

/// Why a pattern string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern '{0}' contains a path separator")]
    PathSeparator(String),
    #[error("pattern '{pattern}' is not a valid glob: {reason}")]
    Invalid { pattern: String, reason: String },
}

impl FilePattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let source = pattern.trim();
        if source.is_empty() {
            return Err(PatternError::Empty);
        }
        if source.contains(['/', '\\']) {
            return Err(PatternError::PathSeparator(source.to_string()));
        }

        let pattern = Pattern::new(source).map_err(|e| PatternError::Invalid {
            pattern: source.to_string(),
            reason: e.msg.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check a bare file name against the pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches_with(file_name, MATCH_OPTIONS)
    }
}

/// Finds files matching one pattern.
#[derive(Debug, Clone)]
pub struct FileLocator {
    pattern: FilePattern,
}

impl FileLocator {
    pub fn new(pattern: FilePattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &FilePattern {
        &self.pattern
    }

    /// Matching files directly inside `dir`.
    pub fn list_dir(&self, dir: &Path) -> Vec<PathBuf> {
        self.search(dir, false)
    }

    /// Matching files anywhere below `root`, `root` itself included.
    pub fn find_recursive(&self, root: &Path) -> Vec<PathBuf> {
        self.search(root, true)
    }

    /// Expand `<root>/[**/]<pattern>`; the root is escaped so it matches literally.
    fn search(&self, root: &Path, recursive: bool) -> Vec<PathBuf> {
        if !root.is_dir() {
            debug!(dir = %root.display(), "Directory not found, skipping");
            return Vec::new();
        }
        let Some(root_str) = root.to_str() else {
            debug!(dir = %root.display(), "Root is not valid UTF-8, skipping");
            return Vec::new();
        };

        let mut full = PathBuf::from(Pattern::escape(root_str));
        if recursive {
            full.push("**");
        }
        full.push(self.pattern.as_str());
        let full = full.to_string_lossy().into_owned();

        let paths = match glob_with(&full, MATCH_OPTIONS) {
            Ok(paths) => paths,
            Err(e) => {
                debug!(pattern = %full, error = %e, "Invalid search pattern, skipping");
                return Vec::new();
            }
        };

        paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .map(|path| absolute(&path))
            .collect()
    }

    /// Matching files under every root, sorted and without duplicates.
    pub fn locate(&self, roots: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for root in roots {
            for path in self.search(root, recursive) {
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        files.sort();
        debug!(pattern = self.pattern.as_str(), count = files.len(), "Located files");
        files
    }

    /// Matching files that live below a directory called `folder`.
    ///
    /// Only the directories under a root are considered, never the root's
    /// own ancestors. With `recursive` unset only `<root>/<folder>` itself is
    /// listed.
    pub fn find_in_folder(&self, roots: &[PathBuf], folder: &str, recursive: bool) -> Vec<PathBuf> {
        if !recursive {
            let dirs: Vec<PathBuf> = roots.iter().map(|root| root.join(folder)).collect();
            return self.locate(&dirs, false);
        }

        let folder = folder.to_lowercase();
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for root in roots {
            let base = absolute(root);
            for path in self.search(root, true) {
                let inside = path
                    .strip_prefix(&base)
                    .is_ok_and(|relative| in_folder(relative, &folder));
                if inside && seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        files.sort();
        files
    }
}

/// True when some directory of the relative `path` is named `folder` (lower-case).
fn in_folder(path: &Path, folder: &str) -> bool {
    path.parent().is_some_and(|parent| {
        parent.components().any(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .is_some_and(|name| name.to_lowercase() == folder),
            _ => false,
        })
    })
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
