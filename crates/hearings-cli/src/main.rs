use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use futures::future;
use hearings::assemble::RunMetadata;
use hearings::config::{DEFAULT_OUT_DIR, DEFAULT_TIMEOUT_SECS, PipelineConfig, ScraperConfig};
use hearings::pipeline::{COMBINED_KEY, Pipeline};
use hearings::scraper::{ScraperError, SourcePayloads, WebScraper, read_payload};
use hearings::store::ArtifactStore;
use hearings::types::{CanonicalRecord, Chamber};
use hearings::utils::{RecordFilter, RecordStats};
use log::LevelFilter;
use schemars::schema_for;

#[derive(Parser)]
#[command(name = "hearings")]
#[command(about = "A committee hearing schedule scraper and history merger", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both chambers, merge the Senate history and write the JSON artifacts
    Run {
        #[arg(long, env = "HEARINGS_HOUSE_URL", help = "House schedule API endpoint")]
        house_url: Option<String>,

        #[arg(long, env = "HEARINGS_SENATE_URL", help = "Senate schedule page")]
        senate_url: Option<String>,

        #[arg(long, env = "HEARINGS_WEEK", help = "Week selector passed to the House API")]
        week: Option<String>,

        #[arg(
            long,
            value_name = "FILE",
            help = "Read the House payload from a file instead of fetching it"
        )]
        house_json: Option<PathBuf>,

        #[arg(
            long,
            value_name = "FILE",
            help = "Read the Senate page from a file instead of fetching it"
        )]
        senate_html: Option<PathBuf>,

        #[arg(
            long,
            env = "HEARINGS_OUT_DIR",
            default_value = DEFAULT_OUT_DIR,
            help = "Directory for the JSON artifacts"
        )]
        out_dir: PathBuf,

        #[arg(
            long,
            value_name = "YYYY",
            help = "Year for date labels without one (defaults to the current year)",
            value_parser = clap::value_parser!(i32).range(1900..=2200)
        )]
        fallback_year: Option<i32>,

        #[arg(long, help = "Keep the raw payloads under <out-dir>/raw")]
        keep_raw: bool,

        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, help = "HTTP timeout in seconds")]
        timeout: u64,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// List hearings from the last run with optional filtering and pagination
    List {
        #[arg(
            long,
            env = "HEARINGS_OUT_DIR",
            default_value = DEFAULT_OUT_DIR,
            help = "Directory holding the JSON artifacts"
        )]
        out_dir: PathBuf,

        #[arg(
            long,
            value_parser = parse_chamber,
            help = "Filter by chamber"
        )]
        chamber: Option<Chamber>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Filter hearings from this date onwards",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        start_date: Option<NaiveDate>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Filter hearings up to this date",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        end_date: Option<NaiveDate>,

        #[arg(short = 'q', long, help = "Search committee, venue, agenda and status")]
        query: Option<String>,

        #[arg(
            long,
            help = "Maximum number of results to return",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        limit: Option<u16>,

        #[arg(
            long,
            help = "Number of results to skip from the beginning",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        offset: Option<u16>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Export JSON schemas of the record and run metadata artifacts
    Schema {
        #[arg(long, default_value = "schemas", help = "Directory to write the schemas to")]
        out_dir: PathBuf,
    },
}

fn parse_chamber(s: &str) -> Result<Chamber, String> {
    Chamber::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

/// A local file wins over fetching; the fetch future is never polled then.
async fn load_payload<F>(file: Option<PathBuf>, fetch: F) -> Result<String, ScraperError>
where
    F: Future<Output = Result<String, ScraperError>>,
{
    match file {
        Some(path) => {
            log::info!("Reading payload from {}...", path.display());
            read_payload(&path)
        }
        None => fetch.await,
    }
}

fn print_run_summary(metadata: &RunMetadata, records: &[CanonicalRecord]) {
    println!("Run at {}", metadata.generated_at.to_rfc3339());
    for report in [&metadata.sources.house, &metadata.sources.senate] {
        match &report.error {
            None => println!(
                "  {:<13} ok      kept {:>3}, dropped {:>3}",
                report.label, report.kept, report.dropped
            ),
            Some(e) => println!("  {:<13} FAILED  {}", report.label, e),
        }
    }
    if let Some(history) = &metadata.history {
        println!("  Senate history entries: {}", history.entries);
    }
    print!("{}", RecordStats::from_records(records));
}

fn export_schemas(out_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;

    let record_schema = schema_for!(CanonicalRecord);
    fs::write(
        out_dir.join("CanonicalRecord.schema.json"),
        serde_json::to_string_pretty(&record_schema)?,
    )?;

    let metadata_schema = schema_for!(RunMetadata);
    fs::write(
        out_dir.join("RunMetadata.schema.json"),
        serde_json::to_string_pretty(&metadata_schema)?,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Run {
            house_url,
            senate_url,
            week,
            house_json,
            senate_html,
            out_dir,
            fallback_year,
            keep_raw,
            timeout,
            format,
        } => {
            let scraper_config = ScraperConfig {
                house_url,
                senate_url,
                week,
                timeout: Duration::from_secs(timeout),
            }
            .validate()
            .unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let pipeline_config = PipelineConfig {
                out_dir,
                fallback_year,
                keep_raw,
            }
            .validate()
            .unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let scraper = WebScraper::new(scraper_config).unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let (house, senate) = future::join(
                load_payload(house_json, scraper.fetch_house_schedule()),
                load_payload(senate_html, scraper.fetch_senate_schedule()),
            )
            .await;

            let pipeline = Pipeline::new(pipeline_config);
            let assembly = pipeline
                .run(SourcePayloads { house, senate }, Utc::now())
                .unwrap_or_else(|e| {
                    log::error!("Error writing artifacts: {}", e);
                    process::exit(1);
                });

            match format {
                OutputFormat::Json => serialize_json(&assembly.metadata),
                OutputFormat::Text => print_run_summary(&assembly.metadata, &assembly.combined),
            }
        }

        Commands::List {
            out_dir,
            chamber,
            start_date,
            end_date,
            query,
            limit,
            offset,
            format,
        } => {
            let record_filter = RecordFilter {
                chamber,
                start_date,
                end_date,
                query,
                limit: limit.map(usize::from),
                offset: offset.map(usize::from),
            };

            let record_filter = record_filter.validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let store = ArtifactStore::new(out_dir);
            let records = store.read_records(COMBINED_KEY).unwrap_or_else(|| {
                log::error!(
                    "No readable hearings in {}; run `hearings run` first",
                    store.root().display()
                );
                process::exit(1);
            });

            let records = record_filter.apply(records);

            match format {
                OutputFormat::Json => serialize_json(&records),
                OutputFormat::Text => {
                    if records.is_empty() {
                        println!("No entries to display.");
                    } else {
                        for (i, record) in records.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, record);
                        }
                        print!("{}", RecordStats::from_records(&records));
                    }
                }
            }
        }

        Commands::Schema { out_dir } => {
            export_schemas(&out_dir).unwrap_or_else(|e| {
                log::error!("Error exporting schemas: {}", e);
                process::exit(1);
            });
            println!("Exported schemas to {}", out_dir.display());
        }
    }
}
