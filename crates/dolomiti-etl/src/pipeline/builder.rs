//! Main ETL pipeline.
//!
//! This module provides the `EtlPipeline` struct and its builder for running
//! the domain loaders over a configuration.

use crate::config::EtlConfig;
use crate::diagnostics::Diagnostic;
use crate::domains::{
    DomainLoad, load_country_origin, load_municipal, load_provincial, load_subzone,
};
use crate::error::Result;
use crate::pipeline::output::EtlOutput;
use crate::pipeline::reporter::{
    ClosureDiagnosticReporter, DiagnosticReporter, DomainKind, NoopReporter,
};
use crate::schema::builtin_schemas;
use crate::table::Record;
use crate::types::SubZone;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// The ETL pipeline.
///
/// Use [`EtlPipeline::builder()`] to create a new pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use dolomiti_etl::{EtlConfig, EtlPipeline};
///
/// let output = EtlPipeline::builder()
///     .config(EtlConfig::builder().root("dati").build()?)
///     .on_diagnostic(|diagnostic| eprintln!("{diagnostic}"))
///     .build()?
///     .run();
///
/// println!("{} municipal rows", output.municipal.len());
/// ```
pub struct EtlPipeline {
    config: EtlConfig,
    domains: Vec<DomainKind>,
    reporter: Arc<dyn DiagnosticReporter>,
}

static_assertions::assert_impl_all!(EtlPipeline: Send, Sync);

impl EtlPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> EtlPipelineBuilder {
        EtlPipelineBuilder::default()
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn domains(&self) -> &[DomainKind] {
        &self.domains
    }

    /// Run every selected domain, one file at a time.
    ///
    /// Never fails: unusable files become diagnostics and domains without
    /// usable files yield empty tables.
    pub fn run(&self) -> EtlOutput {
        let start = Instant::now();
        info!(roots = ?self.config.roots, domains = ?self.domains, "Starting ETL run");

        let mut output = EtlOutput::default();

        for &kind in &self.domains {
            match kind {
                DomainKind::Municipal => {
                    output.municipal =
                        self.collect(kind, load_municipal(&self.config), &mut output.diagnostics);
                }
                DomainKind::Provincial => {
                    output.provincial =
                        self.collect(kind, load_provincial(&self.config), &mut output.diagnostics);
                }
                DomainKind::SubZone => {
                    output.stl_dolomiti = self.collect(
                        kind,
                        load_subzone(&self.config, SubZone::Dolomiti),
                        &mut output.diagnostics,
                    );
                    output.stl_belluno = self.collect(
                        kind,
                        load_subzone(&self.config, SubZone::Belluno),
                        &mut output.diagnostics,
                    );
                }
                DomainKind::CountryOfOrigin => {
                    output.country_origin = self.collect(
                        kind,
                        load_country_origin(&self.config),
                        &mut output.diagnostics,
                    );
                }
            }
        }

        info!(
            rows = output.total_rows(),
            skipped = output.skipped().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ETL run finished"
        );
        output
    }

    /// Forward a domain's diagnostics to the reporter and keep them.
    fn collect<R: Record>(
        &self,
        kind: DomainKind,
        load: DomainLoad<R>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> crate::table::Table<R> {
        for diagnostic in &load.diagnostics {
            self.reporter.report(diagnostic);
        }
        self.reporter.domain_finished(kind, load.table.len());
        diagnostics.extend(load.diagnostics);
        load.table
    }
}

/// Builder for creating an [`EtlPipeline`] instance.
#[derive(Default)]
pub struct EtlPipelineBuilder {
    config: Option<EtlConfig>,
    domains: Option<Vec<DomainKind>>,
    reporter: Option<Arc<dyn DiagnosticReporter>>,
}

static_assertions::assert_impl_all!(EtlPipelineBuilder: Send);

impl EtlPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: EtlConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Restrict the run to some domains. By default every domain runs.
    pub fn domains(mut self, domains: impl IntoIterator<Item = DomainKind>) -> Self {
        let mut selected: Vec<DomainKind> = Vec::new();
        for domain in domains {
            if !selected.contains(&domain) {
                selected.push(domain);
            }
        }
        self.domains = Some(selected);
        self
    }

    /// Set a reporter receiving every diagnostic.
    pub fn reporter(mut self, reporter: Arc<dyn DiagnosticReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Set a diagnostic callback closure.
    ///
    /// This is a convenience method for simple handling.
    /// For more complex scenarios, use [`reporter`](Self::reporter).
    pub fn on_diagnostic<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.reporter = Some(Arc::new(ClosureDiagnosticReporter::new(callback)));
        self
    }

    /// Build the pipeline. Without a reporter, diagnostics are only returned
    /// and logged.
    ///
    /// Returns an error if the configuration or a built-in schema is invalid.
    pub fn build(self) -> Result<EtlPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        for schema in builtin_schemas() {
            schema.validate()?;
        }

        Ok(EtlPipeline {
            config,
            domains: self.domains.unwrap_or_else(|| DomainKind::ALL.to_vec()),
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(NoopReporter)),
        })
    }
}
