//! Bulk Archive Restore Tool
//!
//! Submits restore requests for archived S3 objects under a prefix (or for
//! the failures recorded in an earlier run's log) and records one outcome per
//! object in a CSV log.
//!
//! ```text
//! bulkrestore my-bucket plates/2024/ --filter-in ch1 ch2 --filter-out .txt .csv
//! bulkrestore my-bucket output.csv --from-log --log retry.csv
//! ```

// bulkrestore/src/main.rs
mod config;
mod errors;
mod restore;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use config::{
    CandidateSource, DEFAULT_ARCHIVE_STORAGE_CLASS, DEFAULT_LOG_PATH, DEFAULT_MAX_WORKERS,
    FilterSpec, RestoreTier, RunConfig, StoreSettings,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use store::s3::S3Store;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bulkrestore")]
#[command(about = "Restore archived S3 objects in bulk")]
#[command(version)]
struct Cli {
    /// Name of the bucket
    bucket: String,

    /// Prefix (file or folder) to restore, or a previous log file with --from-log
    prefix: String,

    /// Treat PREFIX as a previous restore log and retry only its ERROR rows
    #[arg(long)]
    from_log: bool,

    /// Keep objects containing ANY of these strings
    #[arg(short = 'i', long = "filter-in", num_args = 1.., action = clap::ArgAction::Append)]
    filter_in: Vec<String>,

    /// Drop objects containing ANY of these strings
    #[arg(short = 'x', long = "filter-out", num_args = 1.., action = clap::ArgAction::Append)]
    filter_out: Vec<String>,

    /// Retrieval tier. Only use Expedited for small batches (<1K files) or emergencies
    #[arg(long, default_value_t = RestoreTier::Standard)]
    tier: RestoreTier,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Where to write the per-object results
    #[arg(short = 'o', long = "log", default_value = DEFAULT_LOG_PATH)]
    log: PathBuf,

    /// Retry failed objects once, writing a second log next to the first
    #[arg(long)]
    retry: bool,

    /// Storage class considered archived when listing a prefix
    #[arg(long, default_value = DEFAULT_ARCHIVE_STORAGE_CLASS)]
    storage_class: String,

    /// JSON file with an s3_storage section for S3-compatible endpoints
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let source = if self.from_log {
            CandidateSource::Log(PathBuf::from(&self.prefix))
        } else {
            CandidateSource::Prefix(self.prefix.clone())
        };
        RunConfig {
            bucket: self.bucket.clone(),
            source,
            filters: FilterSpec::new(self.filter_in.clone(), self.filter_out.clone()),
            tier: self.tier,
            max_workers: self.workers,
            log_path: self.log.clone(),
            retry_once: self.retry,
            archive_storage_class: self.storage_class.clone(),
        }
    }
}

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_app(cli).await {
        Ok(_) => {
            println!("✅ Restore run completed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "bulkrestore=debug" } else { "bulkrestore=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_app(cli: Cli) -> Result<()> {
    let run_config = cli.run_config();

    let settings = match &cli.config {
        Some(path) => StoreSettings::load_from_json(path)
            .context(format!("Failed to load store settings from {}", path.display()))?,
        None => None,
    };

    let store = S3Store::connect(settings.as_ref()).await;
    let report = restore::run_restore_flow(&run_config, Arc::new(store))
        .await
        .context("Restore run failed")?;

    if let Some(primary) = &report.primary {
        println!(
            "Processed {} objects: {} found, {} skipped as not {}, {} left after filtering",
            primary.counts.total(),
            report.candidates_found,
            report.skipped_storage_class,
            run_config.archive_storage_class,
            report.candidates_filtered
        );
    }
    if let Some(retry) = &report.retry {
        println!("Retry results written to {}", retry.log_path.display());
    }
    if report.remaining_errors() > 0 {
        println!(
            "⚠️ {} objects still failed; rerun with --from-log to retry them",
            report.remaining_errors()
        );
    }
    Ok(())
}
