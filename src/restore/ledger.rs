// bulkrestore/src/restore/ledger.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::outcome::{RestoreOutcome, RestoreStatus};
use crate::errors::{AppError, Result};

const RETRY_SUFFIX: &str = "_retry";
const HEADER: [&str; 4] = ["key", "status", "message", "metadata"];

/// Per-status tally for one pass. Every status has an entry, zero if unseen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts(BTreeMap<RestoreStatus, usize>);

impl StatusCounts {
    pub fn tally<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a RestoreOutcome>,
    {
        let zeroed: BTreeMap<RestoreStatus, usize> =
            RestoreStatus::ALL.iter().map(|status| (*status, 0)).collect();
        let counts = outcomes.into_iter().fold(zeroed, |mut acc, outcome| {
            *acc.entry(outcome.status).or_insert(0) += 1;
            acc
        });
        StatusCounts(counts)
    }

    pub fn get(&self, status: RestoreStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

#[derive(Debug, Clone)]
pub struct LedgerSummary {
    pub log_path: PathBuf,
    pub counts: StatusCounts,
    pub errors: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    key: &'a str,
    status: RestoreStatus,
    message: Option<&'a str>,
    metadata: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LedgerEntry {
    key: String,
    status: String,
}

/// An open restore log: created, truncated and headed, waiting for its rows.
pub struct LedgerLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

/// Creates missing parent directories, replaces any file at `log_path` and
/// writes the header. Called before any restore is submitted, so an
/// unwritable log stops the run while nothing has been sent yet.
pub fn create_log(log_path: &Path) -> Result<LedgerLog> {
    if let Some(parent_dir) = log_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir).map_err(|e| AppError::persistence(log_path, e))?;
        }
    }

    // Header written by hand so an empty run still produces a valid log.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(log_path)
        .map_err(|e| AppError::persistence(log_path, e))?;
    writer
        .write_record(HEADER)
        .map_err(|e| AppError::persistence(log_path, e))?;
    writer.flush().map_err(|e| AppError::persistence(log_path, e))?;

    Ok(LedgerLog {
        path: log_path.to_path_buf(),
        writer,
    })
}

impl LedgerLog {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one row per outcome, sorted by key, prints the status counts,
    /// and returns the keys that ended in `ERROR`.
    pub fn finish(mut self, outcomes: &[RestoreOutcome]) -> Result<LedgerSummary> {
        let mut sorted: Vec<&RestoreOutcome> = outcomes.iter().collect();
        sorted.sort_by(|a, b| a.key.cmp(&b.key));

        for outcome in &sorted {
            self.writer
                .serialize(LedgerRow {
                    key: &outcome.key,
                    status: outcome.status,
                    message: outcome.message.as_deref(),
                    metadata: outcome.metadata.as_ref().and_then(|m| m.to_json()),
                })
                .map_err(|e| AppError::persistence(&self.path, e))?;
        }
        self.writer
            .flush()
            .map_err(|e| AppError::persistence(&self.path, e))?;
        debug!(path = %self.path.display(), rows = sorted.len(), "Wrote restore log");

        let counts = StatusCounts::tally(outcomes);
        let errors: BTreeSet<String> = outcomes
            .iter()
            .filter(|o| o.is_error())
            .map(|o| o.key.clone())
            .collect();

        for status in RestoreStatus::ALL {
            println!("{:<12} {}", status.as_str(), counts.get(status));
        }
        println!("📄 Results written to {}", self.path.display());

        Ok(LedgerSummary {
            log_path: self.path,
            counts,
            errors,
        })
    }
}

/// Creates the log at `log_path` and writes `outcomes` to it in one go.
#[allow(dead_code)]
pub fn summarize_and_log(outcomes: &[RestoreOutcome], log_path: &Path) -> Result<LedgerSummary> {
    create_log(log_path)?.finish(outcomes)
}

/// Reads back the keys whose status is `ERROR` from an earlier restore log.
pub fn load_errors_from_log(log_path: &Path) -> Result<Vec<String>> {
    let file = File::open(log_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::LogNotFound(log_path.to_path_buf()),
        _ => AppError::persistence(log_path, e),
    })?;

    let mut reader = csv::Reader::from_reader(file);
    let mut errors = BTreeSet::new();
    for entry in reader.deserialize::<LedgerEntry>() {
        let entry = entry.map_err(|e| AppError::persistence(log_path, e))?;
        if entry.status == RestoreStatus::Error.as_str() {
            errors.insert(entry.key);
        }
    }
    Ok(errors.into_iter().collect())
}

/// `output.csv` becomes `output_retry.csv`; the original log is left alone.
pub fn retry_log_path(log_path: &Path) -> PathBuf {
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match log_path.extension() {
        Some(ext) => format!("{}{}.{}", stem, RETRY_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, RETRY_SUFFIX),
    };
    log_path.with_file_name(file_name)
}
