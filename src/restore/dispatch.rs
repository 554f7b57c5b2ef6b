// bulkrestore/src/restore/dispatch.rs
use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{error, info};

use super::outcome::RestoreOutcome;

const PROGRESS_EVERY: usize = 100;

/// Runs `classify` over every key with at most `max_workers` in flight.
///
/// Keys are started in the order given, and the orchestrator hands them over
/// sorted so an operator can tell from the log how far a run got. Outcomes
/// come back in completion order, exactly one per key; a slow key never holds
/// up the others. Each classification runs on its own task; a task that
/// panics is recorded as an `ERROR` outcome for its key instead of tearing
/// down the batch. Returns once every key has an outcome.
pub async fn dispatch<F, Fut>(keys: Vec<String>, classify: F, max_workers: usize) -> Vec<RestoreOutcome>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = RestoreOutcome> + Send + 'static,
{
    let total = keys.len();
    let workers = max_workers.max(1);
    let mut completed = 0usize;

    let outcomes: Vec<RestoreOutcome> = stream::iter(keys)
        .map(|key| {
            let task = tokio::spawn(classify(key.clone()));
            async move {
                match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(key = %key, error = %e, "Restore worker failed");
                        RestoreOutcome::error(key, format!("worker failed: {}", e), None)
                    }
                }
            }
        })
        .buffer_unordered(workers)
        .inspect(|_| {
            completed += 1;
            if completed % PROGRESS_EVERY == 0 {
                info!("Processed {}/{} objects", completed, total);
            }
        })
        .collect()
        .await;

    info!("Processed all {} objects", total);
    outcomes
}
