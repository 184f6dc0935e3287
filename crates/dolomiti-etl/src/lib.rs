//! Dolomiti Tourism ETL Library
//!
//! Normalization layer for the monthly tourism statistics of the Belluno
//! province: municipalities, the province, the two tourism zones (STL
//! Dolomiti, STL Belluno) and countries of origin.
//!
//! # Overview
//!
//! The source files are hand-made exports with inconsistent encodings,
//! separators, column names and month spellings. This library:
//!
//! - **Locates** candidate files under one or more roots by name pattern
//! - **Reads** them by trying (encoding, delimiter) candidates in order
//! - **Normalizes** column names through declarative per-domain schemas
//! - **Reshapes** wide per-month columns into long rows
//! - **Canonicalizes** months onto a calendar-ordered enum and coerces values
//! - **Merges** everything into sorted, typed tables, empty when no file was usable
//!
//! A file that cannot be used never aborts a run: it is reported as a
//! [`Diagnostic`] and excluded.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dolomiti_etl::{EtlConfig, EtlPipeline, Filter, Metric, annual_totals};
//!
//! let config = EtlConfig::builder().root("dati").build()?;
//!
//! let output = EtlPipeline::builder()
//!     .config(config)
//!     .on_diagnostic(|diagnostic| eprintln!("{diagnostic}"))
//!     .build()?
//!     .run();
//!
//! let df = output.municipal.to_dataframe()?;
//! let totals = annual_totals(&output.provincial, Metric::Arrivals);
//! let recent = Filter::new().years([2023]).apply(&output.country_origin);
//! ```
//!
//! # Single domains
//!
//! Each domain loader can be used on its own and returns the table together
//! with the diagnostics of its files:
//!
//! ```rust,ignore
//! use dolomiti_etl::{EtlConfig, SubZone, load_subzone};
//!
//! let load = load_subzone(&EtlConfig::default(), SubZone::Dolomiti);
//! for diagnostic in load.skipped() {
//!     println!("{diagnostic}");
//! }
//! ```

pub mod canonical;
pub mod config;
pub mod diagnostics;
pub mod domains;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod query;
pub mod reader;
pub mod reshape;
pub mod schema;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use canonical::{canonicalize_month, clean_entity_name, coerce_value, is_aggregate_bucket};
pub use config::{ConfigValidationError, EtlConfig, EtlConfigBuilder};
pub use diagnostics::{Diagnostic, Outcome, SkipReason};
pub use domains::{
    DomainLoad, load_country_origin, load_municipal, load_provincial, load_subzone,
};
pub use error::{EtlError, Result as EtlResult, ResultExt};
pub use locator::{FileLocator, FilePattern};
pub use pipeline::{
    ClosureDiagnosticReporter, DiagnosticReporter, DomainKind, DomainSummary, EtlOutput,
    EtlPipeline, EtlPipelineBuilder, RunSummary,
};
pub use query::{AnnualTotal, Filter, YearComparison, annual_totals, year_comparison};
pub use reader::{Delimiter, RawTable, ReadOptions, ReadOutcome, TextEncoding, read_raw_table};
pub use table::{Record, RecordKey, Table};
pub use types::{
    CountryOriginRecord, Domain, Metric, Month, MonthlyRecord, ProvincialRecord, SubZone,
    SubZoneRecord,
};
