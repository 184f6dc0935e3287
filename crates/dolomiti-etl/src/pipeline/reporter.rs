//! Diagnostic reporting for pipeline runs.
//!
//! Every file the pipeline considers yields one [`Diagnostic`]. Reporters
//! receive them as each domain finishes, in file order.

use crate::diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The groups of domains a run can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Municipal,
    Provincial,
    /// Both STL zones.
    SubZone,
    CountryOfOrigin,
}

impl DomainKind {
    pub const ALL: [DomainKind; 4] = [
        DomainKind::Municipal,
        DomainKind::Provincial,
        DomainKind::SubZone,
        DomainKind::CountryOfOrigin,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Municipal => "Municipal",
            Self::Provincial => "Provincial",
            Self::SubZone => "Sub-zones (STL)",
            Self::CountryOfOrigin => "Country of origin",
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Receives the diagnostics of a run.
///
/// Implement this trait to forward diagnostics to a UI, a file, or a test
/// collector.
pub trait DiagnosticReporter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);

    /// Called once a domain has been loaded.
    fn domain_finished(&self, _domain: DomainKind, _rows: usize) {}
}

/// A reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl DiagnosticReporter for NoopReporter {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// A reporter wrapping a closure.
///
/// ```rust,ignore
/// let reporter = ClosureDiagnosticReporter::new(|diagnostic| {
///     eprintln!("{diagnostic}");
/// });
/// ```
pub struct ClosureDiagnosticReporter<F>
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureDiagnosticReporter<F>
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> DiagnosticReporter for ClosureDiagnosticReporter<F>
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        (self.callback)(diagnostic);
    }
}

static_assertions::assert_impl_all!(NoopReporter: Send, Sync);
static_assertions::assert_impl_all!(Diagnostic: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SkipReason;
    use crate::types::Domain;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureDiagnosticReporter::new(move |_diagnostic| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let diagnostic = Diagnostic::skipped(Path::new("a.txt"), Domain::Municipal, SkipReason::Empty);
        reporter.report(&diagnostic);
        reporter.report(&diagnostic);
        reporter.domain_finished(DomainKind::Municipal, 0);

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_domain_kind_serialization() {
        let json = serde_json::to_string(&DomainKind::CountryOfOrigin).unwrap();
        assert_eq!(json, r#""country_of_origin""#);
    }
}
