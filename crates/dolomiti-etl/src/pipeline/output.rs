//! Results of a pipeline run.

use crate::diagnostics::Diagnostic;
use crate::error::{Result, ResultExt};
use crate::table::{Record, Table};
use crate::types::{
    CountryOriginRecord, Domain, MonthlyRecord, ProvincialRecord, SubZone, SubZoneRecord,
};
use chrono::{DateTime, Local};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// The normalized tables of every domain plus the per-file diagnostics.
///
/// Domains that were not selected, or had no usable file, hold empty tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EtlOutput {
    pub municipal: Table<MonthlyRecord>,
    pub provincial: Table<ProvincialRecord>,
    pub stl_dolomiti: Table<SubZoneRecord>,
    pub stl_belluno: Table<SubZoneRecord>,
    pub country_origin: Table<CountryOriginRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Row counts and coverage of one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary {
    pub domain: Domain,
    pub rows: usize,
    pub years: Vec<i32>,
    pub entities: usize,
    pub duplicate_keys: usize,
    pub files_accepted: usize,
    pub files_skipped: usize,
}

/// Serializable overview of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Local>,
    pub domains: Vec<DomainSummary>,
    pub total_rows: usize,
    pub files_accepted: usize,
    pub files_skipped: usize,
}

impl EtlOutput {
    /// Diagnostics of the files that contributed nothing.
    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_accepted())
    }

    pub fn total_rows(&self) -> usize {
        self.municipal.len()
            + self.provincial.len()
            + self.stl_dolomiti.len()
            + self.stl_belluno.len()
            + self.country_origin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows() == 0
    }

    fn domain_summary<R: Record>(&self, domain: Domain, table: &Table<R>) -> DomainSummary {
        let (accepted, skipped) = self
            .diagnostics
            .iter()
            .filter(|d| d.domain == domain)
            .fold((0, 0), |(a, s), d| {
                if d.is_accepted() { (a + 1, s) } else { (a, s + 1) }
            });
        DomainSummary {
            domain,
            rows: table.len(),
            years: table.years(),
            entities: table.entities().len(),
            duplicate_keys: table.duplicate_keys().len(),
            files_accepted: accepted,
            files_skipped: skipped,
        }
    }

    /// Summarize the run.
    pub fn summary(&self) -> RunSummary {
        let domains = vec![
            self.domain_summary(Domain::Municipal, &self.municipal),
            self.domain_summary(Domain::Provincial, &self.provincial),
            self.domain_summary(Domain::SubZone(SubZone::Dolomiti), &self.stl_dolomiti),
            self.domain_summary(Domain::SubZone(SubZone::Belluno), &self.stl_belluno),
            self.domain_summary(Domain::CountryOfOrigin, &self.country_origin),
        ];
        let files_accepted = self.diagnostics.iter().filter(|d| d.is_accepted()).count();

        RunSummary {
            generated_at: Local::now(),
            domains,
            total_rows: self.total_rows(),
            files_accepted,
            files_skipped: self.diagnostics.len() - files_accepted,
        }
    }

    /// Every table as a named polars frame.
    pub fn dataframes(&self) -> Result<Vec<(&'static str, DataFrame)>> {
        Ok(vec![
            ("comuni", self.municipal.to_dataframe()?),
            ("provincia_belluno", self.provincial.to_dataframe()?),
            ("stl_dolomiti", self.stl_dolomiti.to_dataframe()?),
            ("stl_belluno", self.stl_belluno.to_dataframe()?),
            ("paesi_provenienza", self.country_origin.to_dataframe()?),
        ])
    }

    /// Write every table as a `;`-separated UTF-8 CSV file into `dir`.
    ///
    /// Empty tables are written too, header only.
    pub fn export_csv(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).context(format!("Creating export directory {}", dir.display()))?;

        let mut written = Vec::new();
        for (name, mut df) in self.dataframes()? {
            let path = dir.join(format!("{name}.csv"));
            let mut file =
                File::create(&path).context(format!("Creating {}", path.display()))?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(b';')
                .finish(&mut df)
                .context(format!("Writing {}", path.display()))?;
            info!(path = %path.display(), rows = df.height(), "Exported table");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SkipReason;
    use crate::types::Month;

    fn output() -> EtlOutput {
        EtlOutput {
            municipal: Table::from_rows(vec![
                MonthlyRecord {
                    year: 2023,
                    month: Month::Gen,
                    municipality: "Belluno".to_string(),
                    overnight_stays: 100.0,
                },
                MonthlyRecord {
                    year: 2022,
                    month: Month::Gen,
                    municipality: "Feltre".to_string(),
                    overnight_stays: 50.0,
                },
            ]),
            diagnostics: vec![Diagnostic::skipped(
                Path::new("turismo-per-mese-comune-2021.txt"),
                Domain::Municipal,
                SkipReason::Empty,
            )],
            ..EtlOutput::default()
        }
    }

    #[test]
    fn test_summary() {
        let summary = output().summary();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.domains.len(), 5);

        let municipal = &summary.domains[0];
        assert_eq!(municipal.years, vec![2022, 2023]);
        assert_eq!(municipal.entities, 2);
        assert_eq!(municipal.files_skipped, 1);
        assert_eq!(summary.domains[1].rows, 0);
    }

    #[test]
    fn test_summary_serializes() {
        let json = serde_json::to_value(output().summary()).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["domains"][0]["domain"], "municipal");
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let written = output().export_csv(&dir.path().join("out")).unwrap();
        assert_eq!(written.len(), 5);

        let municipal = fs::read_to_string(&written[0]).unwrap();
        let mut lines = municipal.lines();
        assert_eq!(lines.next(), Some("anno;mese;mese_num;comune;presenze"));
        assert!(lines.next().unwrap().starts_with("2022;Gen;1;Feltre;50"));

        let provincial = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(provincial.trim(), "anno;mese;mese_num;arrivi;presenze");
    }
}
