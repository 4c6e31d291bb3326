//! CLI entry point for the polling stations tool.
//!
//! Provides subcommands for listing stations, inspecting a single station,
//! and writing attendance reports for a filtered set of stations.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use polling_stations::{
    config::Config,
    fetch::{BasicClient, auth::ApiKey},
    infra::stations_api::StationsApiClient,
    output::append_records,
    report,
    selector::{DetailArgs, FilterArgs, FilterSpec, StationSelector, lookup_from_args},
    services::StationDirectory,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const NO_STATIONS: &str = "No stations found by specified parameters.";

#[derive(Parser)]
#[command(name = "polling_stations")]
#[command(about = "Query polling stations and their attendance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ListFilter {
    /// Comma-separated region codes, e.g. "77,50"
    #[arg(short = 'r', long)]
    region_codes: Option<String>,

    /// Comma-separated station numbers, e.g. "1043,1044"
    #[arg(short = 's', long)]
    station_numbers: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stations, optionally filtered by region codes or station numbers
    Stations {
        #[command(flatten)]
        filter: ListFilter,
    },
    /// Show a polling station's full information
    StationInfo {
        /// Internal station id (takes precedence over every other lookup)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        id: Option<u64>,

        /// Region code, city, street, house number and optional building
        #[arg(short = 'b', long, num_args = 1..=5, value_name = "PART")]
        border_address: Option<Vec<String>>,

        /// Region code, used together with --station-number
        #[arg(short = 'r', long)]
        region_code: Option<String>,

        /// Station number within the region
        #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
        station_number: Option<u32>,

        /// Only attendance for this date
        #[arg(short = 'd', long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// Generate a text report about attendance for the selected stations
    Report {
        #[command(flatten)]
        filter: ListFilter,

        /// Report a single station by internal id
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        id: Option<u64>,

        /// Report a single station by address
        #[arg(short = 'b', long, num_args = 1..=5, value_name = "PART")]
        border_address: Option<Vec<String>>,

        /// Only attendance for this date
        #[arg(short = 'd', long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Where to write the text report
        #[arg(short = 'p', long, default_value = "./data/report.txt")]
        path: PathBuf,

        /// Optional: also append per-station stats to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Maximum number of concurrent detail requests (defaults to REPORT_CONCURRENCY)
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing()?;

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let directory = connect(&config)?;

    match cli.command {
        Commands::Stations { filter } => {
            let args = FilterArgs {
                region_codes: filter.region_codes,
                station_numbers: filter.station_numbers,
                ..Default::default()
            };
            let spec = FilterSpec::from_args(&args)?;
            let selection = StationSelector::new(directory.as_ref())
                .resolve(&spec, None)
                .await?;

            if selection.is_empty() {
                println!("{NO_STATIONS}");
                return Ok(());
            }

            for region in &selection.regions {
                println!("Region {}:\n", region.code);
                for station in &region.stations {
                    println!("  {}", station.brief);
                }
            }
            println!(
                "Stations found by specified parameters: {}.",
                selection.station_count()
            );
        }
        Commands::StationInfo {
            id,
            border_address,
            region_code,
            station_number,
            date,
        } => {
            let lookup = lookup_from_args(&DetailArgs {
                station_id: id,
                address: border_address,
                region_code,
                station_number,
            })?;
            let detail = StationSelector::new(directory.as_ref())
                .fetch_detail(&lookup, date)
                .await?;
            print!("{detail}");
        }
        Commands::Report {
            filter,
            id,
            border_address,
            date,
            path,
            csv,
            concurrency,
        } => {
            let args = FilterArgs {
                station_id: id,
                address: border_address,
                region_codes: filter.region_codes,
                station_numbers: filter.station_numbers,
            };
            generate_report(
                directory,
                &args,
                date,
                &path,
                csv.as_deref(),
                concurrency.unwrap_or(config.concurrency),
            )
            .await?;
        }
    }

    Ok(())
}

/// Colored stderr logs plus a daily-rolling JSON log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/polling_stations.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("polling_stations.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn connect(config: &Config) -> Result<Arc<dyn StationDirectory>> {
    let http = BasicClient::with_timeouts(config.request_timeout, config.connect_timeout)
        .context("Failed to build HTTP client")?;

    let directory: Arc<dyn StationDirectory> = match &config.api_key {
        Some(key) => {
            let http = ApiKey::bearer(http, key).context("STATIONS_API_KEY is not a valid header value")?;
            Arc::new(StationsApiClient::new(&config.api_url, http)?)
        }
        None => Arc::new(StationsApiClient::new(&config.api_url, http)?),
    };

    info!(api_url = %config.api_url, auth = config.api_key.is_some(), "Station directory configured");
    Ok(directory)
}

/// Writes the report (plus the optional CSV) and tells the operator how it went.
async fn generate_report(
    directory: Arc<dyn StationDirectory>,
    args: &FilterArgs,
    date: Option<NaiveDate>,
    path: &Path,
    csv: Option<&Path>,
    concurrency: usize,
) -> Result<()> {
    let Some(report) = report::generate(directory, args, date, path, concurrency).await? else {
        println!("{NO_STATIONS}");
        return Ok(());
    };

    if let Some(csv) = csv {
        append_records(csv, &report)
            .with_context(|| format!("Failed to append CSV records to {}", csv.display()))?;
    }

    let unavailable = report.unavailable_count();
    if unavailable > 0 {
        warn!(unavailable, "Some stations are missing from the report details");
    }

    println!("File is created successfully with the content.");
    Ok(())
}
