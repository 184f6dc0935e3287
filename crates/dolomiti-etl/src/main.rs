//! CLI entry point for the Dolomiti tourism ETL.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dolomiti_etl::{DomainKind, EtlConfig, EtlOutput, EtlPipeline, RunSummary};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

/// Environment variable holding the default data root.
const DATA_ROOT_ENV: &str = "DOLOMITI_DATA_ROOT";

/// CLI-compatible domain selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliDomain {
    /// Every domain
    All,
    /// Municipal monthly stays
    Municipal,
    /// Province-wide arrivals and stays
    Provincial,
    /// STL Dolomiti and STL Belluno
    Subzone,
    /// Foreign stays by country of origin
    Country,
}

impl CliDomain {
    fn kinds(self) -> Vec<DomainKind> {
        match self {
            CliDomain::All => DomainKind::ALL.to_vec(),
            CliDomain::Municipal => vec![DomainKind::Municipal],
            CliDomain::Provincial => vec![DomainKind::Provincial],
            CliDomain::Subzone => vec![DomainKind::SubZone],
            CliDomain::Country => vec![DomainKind::CountryOfOrigin],
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Normalize the Belluno province tourism statistics",
    long_about = "Locates the monthly tourism exports (municipal, provincial, STL zones, \
                  countries of origin), normalizes them and prints a summary.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  DOLOMITI_DATA_ROOT    Default data root when --root is not given\n  \
                  RUST_LOG              Log filter, overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Scan the current directory recursively\n  \
                  dolomiti-etl\n\n  \
                  # Only the provincial files of one folder, exported to CSV\n  \
                  dolomiti-etl --root dati --no-recursive --domain provincial --export out/\n\n  \
                  # Machine-readable summary\n  \
                  dolomiti-etl --root dati --json"
)]
struct Args {
    /// Data root to search (repeatable)
    #[arg(short, long)]
    root: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only list the roots themselves, without descending into subfolders
    #[arg(long)]
    no_recursive: bool,

    /// Domains to load (repeatable)
    #[arg(short, long, value_enum, default_value = "all")]
    domain: Vec<CliDomain>,

    /// Write every table as CSV into this directory
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the human-readable summary
    ///
    /// Disables all logs; only the summary and the diagnostics are written.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Merge the config file, the environment and the flags into one configuration.
fn build_config(args: &Args) -> Result<EtlConfig> {
    let mut config = match &args.config {
        Some(path) => EtlConfig::from_json_file(path)?,
        None => EtlConfig::default(),
    };

    if !args.root.is_empty() {
        config.roots = args.root.clone();
    } else if args.config.is_none()
        && let Ok(root) = std::env::var(DATA_ROOT_ENV)
    {
        config.roots = vec![PathBuf::from(root)];
    }

    if args.no_recursive {
        config.recursive = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let config = build_config(&args)?;
    let domains: Vec<DomainKind> = args.domain.iter().flat_map(|d| d.kinds()).collect();

    let output = EtlPipeline::builder()
        .config(config)
        .domains(domains)
        .build()?
        .run();

    if let Some(dir) = &args.export {
        let written = output.export_csv(dir)?;
        info!("Exported {} tables to {}", written.len(), dir.display());
    }

    let summary = output.summary();

    if args.json {
        let skipped: Vec<_> = output.skipped().collect();
        let report = serde_json::json!({
            "summary": summary,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&summary, &output);
    }

    if output.is_empty() {
        error!("No usable data found");
        return Err(anyhow!("No usable data found in any domain"));
    }

    Ok(())
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(summary: &RunSummary, output: &EtlOutput) {
    println!();
    println!("{}", "=".repeat(80));
    println!("ETL COMPLETE ({})", summary.generated_at.format("%Y-%m-%d %H:%M:%S"));
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "{:<20} {:>8} {:>10} {:>9} {:>9}  {}",
        "Domain", "Rows", "Entities", "Accepted", "Skipped", "Years"
    );
    println!("{}", "-".repeat(80));
    for domain in &summary.domains {
        let years = match (domain.years.first(), domain.years.last()) {
            (Some(first), Some(last)) if first != last => format!("{first}-{last}"),
            (Some(first), _) => first.to_string(),
            _ => "-".to_string(),
        };
        println!(
            "{:<20} {:>8} {:>10} {:>9} {:>9}  {}",
            domain.domain.display_name(),
            domain.rows,
            domain.entities,
            domain.files_accepted,
            domain.files_skipped,
            years
        );
    }
    println!();

    let duplicated: Vec<_> = summary
        .domains
        .iter()
        .filter(|d| d.duplicate_keys > 0)
        .collect();
    if !duplicated.is_empty() {
        println!("Duplicate keys (all rows retained):");
        for domain in duplicated {
            println!("  ! {}: {} keys", domain.domain, domain.duplicate_keys);
        }
        println!();
    }

    let skipped: Vec<_> = output.skipped().collect();
    if !skipped.is_empty() {
        println!("Skipped files:");
        for diagnostic in skipped {
            println!("  ! {diagnostic}");
        }
        println!();
    }

    println!(
        "Total: {} rows from {} files ({} skipped)",
        summary.total_rows, summary.files_accepted, summary.files_skipped
    );
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_domain_kinds() {
        assert_eq!(CliDomain::All.kinds().len(), 4);
        assert_eq!(CliDomain::Subzone.kinds(), vec![DomainKind::SubZone]);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "dolomiti-etl",
            "--root",
            "a",
            "--root",
            "b",
            "--domain",
            "provincial",
            "--no-recursive",
        ]);
        assert_eq!(args.root, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(args.domain, vec![CliDomain::Provincial]);

        let config = build_config(&args).unwrap();
        assert!(!config.recursive);
        assert_eq!(config.roots.len(), 2);
    }

    #[test]
    fn test_default_domain_is_all() {
        let args = Args::parse_from(["dolomiti-etl"]);
        assert_eq!(args.domain, vec![CliDomain::All]);
    }
}
