pub(crate) mod classify;
pub(crate) mod dispatch;
pub(crate) mod filter;
pub(crate) mod ledger;
mod logic;
pub(crate) mod outcome;

use std::sync::Arc;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::store::ObjectStore;

pub use logic::RunReport;

/// Public entry point for a restore run: acquire candidates, filter them,
/// submit restores, write the log, and retry failures once if asked to.
pub async fn run_restore_flow(config: &RunConfig, store: Arc<dyn ObjectStore>) -> Result<RunReport> {
    println!(
        "Restore source: s3://{} ({} tier, {} workers)",
        config.bucket, config.tier, config.max_workers
    );
    logic::perform_restore_orchestration(config, store).await
}
