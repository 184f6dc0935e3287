//! Configuration types for the ETL pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::error::{Result, ResultExt};
use crate::locator::FilePattern;
use crate::reader::{Delimiter, ReadOptions, TextEncoding};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MUNICIPAL_PATTERN: &str = "turismo-per-mese-comune*.txt";
pub const DEFAULT_PROVINCIAL_PATTERN: &str = "presenze-arrivi-provincia-belluno*.txt";
pub const DEFAULT_COUNTRY_PATTERN: &str = "presenze-dolomiti-estero-*.txt";
pub const DEFAULT_SUBZONE_PATTERN: &str = "*.txt";
pub const DEFAULT_STL_DOLOMITI_FOLDER: &str = "stl-dolomiti";
pub const DEFAULT_STL_BELLUNO_FOLDER: &str = "stl-belluno";

/// Configuration for the ETL pipeline.
///
/// Use [`EtlConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use dolomiti_etl::config::EtlConfig;
///
/// let config = EtlConfig::builder()
///     .root("data")
///     .recursive(false)
///     .min_columns(3)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Base directories searched for source files.
    /// Default: ["."]
    pub roots: Vec<PathBuf>,

    /// Whether to descend into subdirectories of the roots.
    /// Default: true
    pub recursive: bool,

    /// File name pattern of the municipal files.
    pub municipal_pattern: String,

    /// File name pattern of the provincial files.
    pub provincial_pattern: String,

    /// File name pattern of the country-of-origin files.
    pub country_pattern: String,

    /// File name pattern of the sub-zone files, matched inside the STL folders.
    pub subzone_pattern: String,

    /// Folder holding the STL Dolomiti files.
    pub stl_dolomiti_folder: String,

    /// Folder holding the STL Belluno files.
    pub stl_belluno_folder: String,

    /// Encodings tried in order.
    /// Default: UTF-8, then Latin-1
    pub encodings: Vec<TextEncoding>,

    /// Delimiters tried in order.
    /// Default: `;`, `,`, tab
    pub delimiters: Vec<Delimiter>,

    /// Minimum number of non-blank header columns for a parse to be accepted.
    /// Default: 2
    pub min_columns: usize,

    /// Zero-based line of the header in the country-of-origin files.
    /// Default: 1 (the first line is a title)
    pub country_header_line: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            recursive: true,
            municipal_pattern: DEFAULT_MUNICIPAL_PATTERN.to_string(),
            provincial_pattern: DEFAULT_PROVINCIAL_PATTERN.to_string(),
            country_pattern: DEFAULT_COUNTRY_PATTERN.to_string(),
            subzone_pattern: DEFAULT_SUBZONE_PATTERN.to_string(),
            stl_dolomiti_folder: DEFAULT_STL_DOLOMITI_FOLDER.to_string(),
            stl_belluno_folder: DEFAULT_STL_BELLUNO_FOLDER.to_string(),
            encodings: TextEncoding::DEFAULT_ORDER.to_vec(),
            delimiters: Delimiter::DEFAULT_ORDER.to_vec(),
            min_columns: 2,
            country_header_line: 1,
        }
    }
}

impl EtlConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EtlConfigBuilder {
        EtlConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Reading config file {}", path.display()))?;
        let config: EtlConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.roots.is_empty() {
            return Err(ConfigValidationError::NoRoots);
        }

        if self.encodings.is_empty() {
            return Err(ConfigValidationError::EmptyCandidates {
                field: "encodings".to_string(),
            });
        }

        if self.delimiters.is_empty() {
            return Err(ConfigValidationError::EmptyCandidates {
                field: "delimiters".to_string(),
            });
        }

        if self.min_columns == 0 {
            return Err(ConfigValidationError::InvalidMinColumns(self.min_columns));
        }

        for (field, pattern) in [
            ("municipal_pattern", &self.municipal_pattern),
            ("provincial_pattern", &self.provincial_pattern),
            ("country_pattern", &self.country_pattern),
            ("subzone_pattern", &self.subzone_pattern),
        ] {
            FilePattern::parse(pattern).map_err(|_| ConfigValidationError::InvalidPattern {
                field: field.to_string(),
                pattern: pattern.clone(),
            })?;
        }

        for (field, folder) in [
            ("stl_dolomiti_folder", &self.stl_dolomiti_folder),
            ("stl_belluno_folder", &self.stl_belluno_folder),
        ] {
            if folder.trim().is_empty() {
                return Err(ConfigValidationError::InvalidPattern {
                    field: field.to_string(),
                    pattern: folder.clone(),
                });
            }
        }

        Ok(())
    }

    /// Reader options for files whose header sits on `header_line`.
    pub fn read_options(&self, header_line: usize) -> ReadOptions {
        ReadOptions {
            encodings: self.encodings.clone(),
            delimiters: self.delimiters.clone(),
            min_columns: self.min_columns,
            header_line,
        }
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("No data root configured")]
    NoRoots,

    #[error("Candidate list '{field}' is empty")]
    EmptyCandidates { field: String },

    #[error("Invalid minimum column count: {0} (must be at least 1)")]
    InvalidMinColumns(usize),

    #[error("Invalid file pattern for '{field}': '{pattern}'")]
    InvalidPattern { field: String, pattern: String },
}

/// Builder for [`EtlConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EtlConfigBuilder {
    roots: Vec<PathBuf>,
    recursive: Option<bool>,
    municipal_pattern: Option<String>,
    provincial_pattern: Option<String>,
    country_pattern: Option<String>,
    subzone_pattern: Option<String>,
    stl_dolomiti_folder: Option<String>,
    stl_belluno_folder: Option<String>,
    encodings: Option<Vec<TextEncoding>>,
    delimiters: Option<Vec<Delimiter>>,
    min_columns: Option<usize>,
    country_header_line: Option<usize>,
}

impl EtlConfigBuilder {
    /// Add a data root. Without any, the current directory is used.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    /// Add several data roots at once.
    pub fn roots<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Enable or disable recursive descent below the roots.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    pub fn municipal_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.municipal_pattern = Some(pattern.into());
        self
    }

    pub fn provincial_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.provincial_pattern = Some(pattern.into());
        self
    }

    pub fn country_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.country_pattern = Some(pattern.into());
        self
    }

    pub fn subzone_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.subzone_pattern = Some(pattern.into());
        self
    }

    /// Set the folder names of the two STL zones.
    pub fn stl_folders(mut self, dolomiti: impl Into<String>, belluno: impl Into<String>) -> Self {
        self.stl_dolomiti_folder = Some(dolomiti.into());
        self.stl_belluno_folder = Some(belluno.into());
        self
    }

    /// Set the encodings tried by the reader, in order.
    pub fn encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = Some(encodings);
        self
    }

    /// Set the delimiters tried by the reader, in order.
    pub fn delimiters(mut self, delimiters: Vec<Delimiter>) -> Self {
        self.delimiters = Some(delimiters);
        self
    }

    /// Set the minimum number of header columns a parse needs.
    pub fn min_columns(mut self, min_columns: usize) -> Self {
        self.min_columns = Some(min_columns);
        self
    }

    /// Set the zero-based header line of the country-of-origin files.
    pub fn country_header_line(mut self, line: usize) -> Self {
        self.country_header_line = Some(line);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EtlConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<EtlConfig, ConfigValidationError> {
        let defaults = EtlConfig::default();
        let config = EtlConfig {
            roots: if self.roots.is_empty() {
                defaults.roots
            } else {
                self.roots
            },
            recursive: self.recursive.unwrap_or(defaults.recursive),
            municipal_pattern: self.municipal_pattern.unwrap_or(defaults.municipal_pattern),
            provincial_pattern: self
                .provincial_pattern
                .unwrap_or(defaults.provincial_pattern),
            country_pattern: self.country_pattern.unwrap_or(defaults.country_pattern),
            subzone_pattern: self.subzone_pattern.unwrap_or(defaults.subzone_pattern),
            stl_dolomiti_folder: self
                .stl_dolomiti_folder
                .unwrap_or(defaults.stl_dolomiti_folder),
            stl_belluno_folder: self
                .stl_belluno_folder
                .unwrap_or(defaults.stl_belluno_folder),
            encodings: self.encodings.unwrap_or(defaults.encodings),
            delimiters: self.delimiters.unwrap_or(defaults.delimiters),
            min_columns: self.min_columns.unwrap_or(defaults.min_columns),
            country_header_line: self
                .country_header_line
                .unwrap_or(defaults.country_header_line),
        };

        config.validate()?;
        Ok(config)
    }
}
