//! Pipeline module.
//!
//! This module provides the ETL pipeline, its output and diagnostic reporting.

mod builder;
mod output;
pub mod reporter;

pub use builder::{EtlPipeline, EtlPipelineBuilder};
pub use output::{DomainSummary, EtlOutput, RunSummary};
pub use reporter::{ClosureDiagnosticReporter, DiagnosticReporter, DomainKind, NoopReporter};
