// bulkrestore/src/restore/classify.rs
use tracing::{debug, warn};

use super::outcome::RestoreOutcome;
use crate::config::RestoreTier;
use crate::store::{ObjectStore, RestoreState};

/// Works out where `key` stands and submits a restore if it needs one.
///
/// Issues exactly one head request and at most one restore request. Every
/// failure is folded into an `ERROR` outcome, so this never fails as a whole.
pub async fn classify(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    tier: RestoreTier,
) -> RestoreOutcome {
    let metadata = match store.head(bucket, key).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(key, error = %e, "Could not read object metadata");
            return RestoreOutcome::error(key, e.to_string(), None);
        }
    };

    if !metadata.is_archived() {
        debug!(key, "Object is not archived");
        return RestoreOutcome::restored(key);
    }

    match metadata.restore_state() {
        RestoreState::Completed { expiry } => {
            debug!(key, expiry = ?expiry, "Restored copy already available");
            RestoreOutcome::restored(key)
        }
        RestoreState::Ongoing => {
            debug!(key, "Restore already in progress");
            RestoreOutcome::in_progress(key)
        }
        RestoreState::NotRequested => match store.restore(bucket, key, tier).await {
            Ok(()) => {
                debug!(key, tier = %tier, "Restore requested");
                RestoreOutcome::requested(key)
            }
            Err(e) => {
                warn!(key, error = %e, "Could not restore object");
                RestoreOutcome::error(key, e.to_string(), Some(metadata))
            }
        },
    }
}
