//! Batch, stat weight and progress reporting tests

mod common;

use std::sync::Arc;

use dpsim::aggregate::{
    compute_stat_weights, run_batch, stat_weights_with_progress, StatWeightsRequest,
};
use dpsim::core::{CancelToken, SimError, Stat};

use common::{config, frost_mage, init_tracing, scenario, FROSTBOLT};

#[test]
fn test_batch_is_reproducible_across_worker_counts() {
    init_tracing();
    let mut single = config(60.0, 200);
    single.options.workers = 1;
    let mut parallel = config(60.0, 200);
    parallel.options.workers = 4;

    let a = run_batch(&scenario(single, vec![frost_mage(20_000.0)]), &CancelToken::new()).unwrap();
    let b = run_batch(&scenario(parallel, vec![frost_mage(20_000.0)]), &CancelToken::new()).unwrap();

    assert_eq!(a.iterations_completed, 200);
    assert!(!a.aborted);
    assert_eq!(a.dps, b.dps);
    assert_eq!(a.casts, b.casts);
    let total: u64 = a.dps.histogram.iter().map(|(_, n)| n).sum();
    assert_eq!(total, 200);
    assert!(a.dps.min <= a.dps.avg && a.dps.avg <= a.dps.max);
}

#[test]
fn test_batch_counts_oom_iterations() {
    let scenario = scenario(config(60.0, 20), vec![frost_mage(1000.0)]);
    let output = run_batch(&scenario, &CancelToken::new()).unwrap();
    assert_eq!(output.num_oom, 20);
    assert!((output.oom_at_avg - 5.0).abs() < 1e-9);
    assert_eq!(output.casts[&FROSTBOLT.key()].casts, 40);
}

#[test]
fn test_cancelled_batch_reports_partial_output() {
    let scenario = scenario(config(60.0, 100), vec![frost_mage(20_000.0)]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let output = run_batch(&scenario, &cancel).unwrap();
    assert!(output.aborted);
    assert_eq!(output.iterations_completed, 0);
    assert!(output.summary().ends_with("aborted"));
}

#[test]
fn test_stat_without_effect_has_zero_weight() {
    let scenario = scenario(config(60.0, 50), vec![frost_mage(20_000.0)]);
    let request = StatWeightsRequest::new(vec![Stat::Healing, Stat::SpellPower], Stat::SpellPower);

    let result = compute_stat_weights(&scenario, &request, &CancelToken::new()).unwrap();

    assert_eq!(result.weights[0], 0.0);
    assert_eq!(result.ep_values[0], 0.0);
    assert!(result.weights[1] > 0.0);
    assert!((result.ep_values[1] - 1.0).abs() < 1e-12);
    assert!(result.baseline_dps > 0.0);
}

#[test]
fn test_cancelled_stat_weights_abort() {
    let scenario = scenario(config(60.0, 50), vec![frost_mage(20_000.0)]);
    let request = StatWeightsRequest::new(vec![Stat::SpellCrit], Stat::SpellPower);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = compute_stat_weights(&scenario, &request, &cancel).unwrap_err();
    assert!(matches!(err, SimError::Aborted));
}

#[tokio::test]
async fn test_progress_stream_ends_with_result() {
    let scenario = Arc::new(scenario(config(30.0, 20), vec![frost_mage(20_000.0)]));
    let request = StatWeightsRequest::new(vec![Stat::SpellCrit, Stat::SpellHit], Stat::SpellPower);

    let (mut progress, handle) = stat_weights_with_progress(scenario, request, CancelToken::new());

    let mut snapshots = Vec::new();
    while let Some(snapshot) = progress.recv().await {
        snapshots.push(snapshot);
    }
    let result = handle.await.unwrap().unwrap();

    // baseline, two weighed stats, the reference stat, then the final snapshot
    assert_eq!(snapshots.len(), 5);
    assert!(snapshots.windows(2).all(|w| w[0].batches_done <= w[1].batches_done));
    assert_eq!(snapshots[0].stat, None);
    let last = snapshots.last().unwrap();
    assert!(last.complete);
    assert_eq!(last.iterations_done, last.iterations_total);
    assert_eq!(last.result.as_ref(), Some(&result));
    assert!(last.error.is_none());
    assert_eq!(result.weights.len(), 2);
}

#[tokio::test]
async fn test_failed_progress_stream_still_ends_with_complete_snapshot() {
    let scenario = Arc::new(scenario(config(30.0, 20), vec![frost_mage(20_000.0)]));
    let request = StatWeightsRequest::new(vec![Stat::SpellCrit], Stat::SpellPower);
    let cancel = CancelToken::new();
    cancel.cancel();

    let (mut progress, handle) = stat_weights_with_progress(scenario, request, cancel);

    let mut snapshots = Vec::new();
    while let Some(snapshot) = progress.recv().await {
        snapshots.push(snapshot);
    }
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, SimError::Aborted));

    assert_eq!(snapshots.len(), 1);
    let last = &snapshots[0];
    assert!(last.complete);
    assert_eq!(last.batches_done, 0);
    assert!(last.result.is_none());
    assert_eq!(last.error.as_deref(), Some(err.to_string().as_str()));
}
