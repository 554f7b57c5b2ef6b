// bulkrestore/src/restore/logic.rs
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::classify::classify;
use super::dispatch::dispatch;
use super::filter;
use super::ledger::{self, LedgerSummary};
use super::outcome::RestoreOutcome;
use crate::config::{CandidateSource, RestoreTier, RunConfig};
use crate::errors::{AppError, Result};
use crate::store::ObjectStore;

/// Past this many keys an Expedited run gets expensive quickly.
const EXPEDITED_WARN_THRESHOLD: usize = 1000;

/// What a run did, pass by pass.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Keys returned by the listing or the replayed log.
    pub candidates_found: usize,
    /// Listed keys left out because they are not in the archive storage class.
    pub skipped_storage_class: usize,
    pub candidates_filtered: usize,
    pub primary: Option<LedgerSummary>,
    pub retry: Option<LedgerSummary>,
}

impl RunReport {
    /// Keys still in `ERROR` after the last pass that ran.
    pub fn remaining_errors(&self) -> usize {
        self.retry
            .as_ref()
            .or(self.primary.as_ref())
            .map_or(0, |summary| summary.errors.len())
    }
}

pub async fn perform_restore_orchestration(
    config: &RunConfig,
    store: Arc<dyn ObjectStore>,
) -> Result<RunReport> {
    config.validate()?;
    let mut report = RunReport::default();

    let candidates = match &config.source {
        CandidateSource::Prefix(prefix) => {
            let listed = store
                .list(&config.bucket, prefix)
                .await
                .map_err(|source| AppError::Listing {
                    bucket: config.bucket.clone(),
                    prefix: prefix.clone(),
                    source,
                })?;
            if listed.is_empty() {
                println!("No files found in s3://{}/{}", config.bucket, prefix);
                return Ok(report);
            }
            report.candidates_found = listed.len();

            let (archived, other): (Vec<_>, Vec<_>) = listed.into_iter().partition(|object| {
                object.storage_class.as_deref() == Some(config.archive_storage_class.as_str())
            });
            report.skipped_storage_class = other.len();
            println!("🔍 {} total files found pre-filtering", report.candidates_found);
            if !other.is_empty() {
                println!(
                    "   {} files are not in {} and need no restore",
                    other.len(),
                    config.archive_storage_class
                );
            }
            archived.into_iter().map(|object| object.key).collect::<Vec<_>>()
        }
        CandidateSource::Log(log_path) => {
            let keys = ledger::load_errors_from_log(log_path)?;
            report.candidates_found = keys.len();
            println!(
                "🔍 {} failed files found in {} pre-filtering",
                keys.len(),
                log_path.display()
            );
            keys
        }
    };

    if !config.filters.is_empty() {
        debug!(include = ?config.filters.include, exclude = ?config.filters.exclude, "Applying filters");
    }
    let mut keys = filter::apply(candidates, &config.filters);
    report.candidates_filtered = keys.len();
    println!("{} total files remain post-filtering", keys.len());

    if expedited_is_costly(config.tier, keys.len()) {
        warn!(
            count = keys.len(),
            "Expedited tier requested for a large batch; Standard is much cheaper"
        );
    }

    let primary_log = ledger::create_log(&config.log_path)?;
    // Sorted so progress can be read off the log.
    keys.sort();
    let outcomes = run_pass(config, &store, keys).await;
    let primary = primary_log.finish(&outcomes)?;

    if config.retry_once && !primary.errors.is_empty() {
        let retry_keys: Vec<String> = primary.errors.iter().cloned().collect();
        let retry_log = ledger::create_log(&ledger::retry_log_path(&config.log_path))?;
        println!("🔄 Retrying {} failed files...", retry_keys.len());
        let retry_outcomes = run_pass(config, &store, retry_keys).await;
        report.retry = Some(retry_log.finish(&retry_outcomes)?);
    }

    report.primary = Some(primary);
    Ok(report)
}

fn expedited_is_costly(tier: RestoreTier, count: usize) -> bool {
    tier == RestoreTier::Expedited && count > EXPEDITED_WARN_THRESHOLD
}

async fn run_pass(
    config: &RunConfig,
    store: &Arc<dyn ObjectStore>,
    keys: Vec<String>,
) -> Vec<RestoreOutcome> {
    info!(
        bucket = %config.bucket,
        tier = %config.tier,
        workers = config.max_workers,
        count = keys.len(),
        "Dispatching restore requests"
    );
    let bucket: Arc<str> = Arc::from(config.bucket.as_str());
    let tier = config.tier;
    dispatch(
        keys,
        |key| {
            let store = Arc::clone(store);
            let bucket = Arc::clone(&bucket);
            async move { classify(store.as_ref(), &bucket, &key, tier).await }
        },
        config.max_workers,
    )
    .await
}
