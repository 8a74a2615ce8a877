//! Asynchronous progress for long stat-weight runs
//!
//! The driver runs every CPU-bound batch on tokio's blocking pool and sends a
//! snapshot after each one over a bounded channel. The last snapshot is
//! marked `complete` and carries either the final result or, when a batch
//! failed or was cancelled, the error. Snapshots that cannot be delivered
//! (receiver dropped) are discarded; the computation continues.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::aggregate::weights::{assemble, run_planned, StatWeightsRequest, StatWeightsResult};
use crate::core::cancel::CancelToken;
use crate::core::error::{Result, SimError};
use crate::core::stats::Stat;
use crate::core::types::ActionId;
use crate::simulation::scenario::Scenario;

/// Buffered snapshots before the driver starts dropping them.
pub const PROGRESS_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub batches_done: usize,
    pub batches_total: usize,
    pub iterations_done: u64,
    pub iterations_total: u64,
    /// Stat of the batch that just finished; `None` for the baseline.
    pub stat: Option<Stat>,
    pub dps: f64,
    pub complete: bool,
    pub result: Option<StatWeightsResult>,
    /// Set on the final snapshot when the computation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Start a stat-weight computation on the current tokio runtime.
///
/// Returns the progress receiver and a handle resolving to the result.
pub fn stat_weights_with_progress(
    scenario: Arc<Scenario>,
    request: StatWeightsRequest,
    cancel: CancelToken,
) -> (mpsc::Receiver<ProgressSnapshot>, JoinHandle<Result<StatWeightsResult>>) {
    let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
    let handle = tokio::spawn(drive(scenario, request, cancel, tx));
    (rx, handle)
}

async fn drive(
    scenario: Arc<Scenario>,
    request: StatWeightsRequest,
    cancel: CancelToken,
    tx: mpsc::Sender<ProgressSnapshot>,
) -> Result<StatWeightsResult> {
    let per_batch = u64::from(scenario.options.iterations);
    let batches_total = request.plan().len();
    let iterations_total = per_batch * batches_total as u64;
    let mut done = 0;

    let outcome = run_batches(scenario, request, cancel, &tx, &mut done).await;
    let last = ProgressSnapshot {
        batches_done: done,
        batches_total,
        iterations_done: per_batch * done as u64,
        iterations_total,
        stat: None,
        dps: outcome.as_ref().map_or(0.0, |r| r.baseline_dps),
        complete: true,
        result: outcome.as_ref().ok().cloned(),
        error: outcome.as_ref().err().map(|e| e.to_string()),
    };
    // The final snapshot waits for room rather than being dropped.
    if tx.send(last).await.is_err() {
        debug!("progress receiver closed before completion");
    }
    outcome
}

async fn run_batches(
    scenario: Arc<Scenario>,
    request: StatWeightsRequest,
    cancel: CancelToken,
    tx: &mpsc::Sender<ProgressSnapshot>,
    done: &mut usize,
) -> Result<StatWeightsResult> {
    request.validate()?;
    let request = Arc::new(request);
    let plan = request.plan();
    let per_batch = u64::from(scenario.options.iterations);
    let iterations_total = per_batch * plan.len() as u64;

    let mut outputs = Vec::with_capacity(plan.len());
    for step in plan.iter().copied() {
        let batch = {
            let scenario = Arc::clone(&scenario);
            let request = Arc::clone(&request);
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || run_planned(&scenario, &request, step, &cancel))
                .await
                .map_err(|e| SimError::invariant(ActionId::default(), format!("batch worker failed: {e}")))??
        };
        *done += 1;
        let snapshot = ProgressSnapshot {
            batches_done: *done,
            batches_total: plan.len(),
            iterations_done: per_batch * *done as u64,
            iterations_total,
            stat: step,
            dps: batch.dps.avg,
            complete: false,
            result: None,
            error: None,
        };
        if tx.try_send(snapshot).is_err() {
            debug!(batch = *done, "progress snapshot dropped");
        }
        outputs.push((step, batch));
    }

    assemble(&request, &outputs)
}
