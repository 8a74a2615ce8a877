//! Monte-Carlo batches
//!
//! Iterations are independent and split into fixed-size chunks that rayon
//! runs in parallel. Each chunk folds its results into a private
//! [`BatchAccumulator`]; chunks are merged afterwards in index order, so the
//! aggregate of a fixed seed does not depend on thread scheduling.

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregate::output::{BatchOutput, DpsSummary};
use crate::aggregate::summary::{Histogram, RunningStats};
use crate::combat::metrics::CastMetrics;
use crate::core::cancel::CancelToken;
use crate::core::error::{Result, SimError};
use crate::simulation::result::IterationResult;
use crate::simulation::scenario::Scenario;

const CHUNK_SIZE: u32 = 64;

/// Mergeable running aggregate of iteration results.
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    dps: RunningStats,
    histogram: Histogram,
    casts: BTreeMap<String, CastMetrics>,
    uptime_sums: BTreeMap<String, f64>,
    oom_at: RunningStats,
    dps_at_oom: RunningStats,
    logs: Vec<String>,
}

impl BatchAccumulator {
    pub fn new(histogram_bucket: f64) -> Self {
        Self {
            histogram: Histogram::new(histogram_bucket),
            ..Self::default()
        }
    }

    pub fn completed(&self) -> u64 {
        self.dps.count()
    }

    pub fn add(&mut self, result: IterationResult) {
        self.dps.push(result.dps);
        self.histogram.push(result.dps);
        for (key, metrics) in &result.casts {
            self.casts.entry(key.clone()).or_default().merge(metrics);
        }
        for (key, uptime) in &result.debuff_uptime {
            *self.uptime_sums.entry(key.clone()).or_default() += uptime;
        }
        if let (Some(at), Some(dps)) = (result.oom_at_secs, result.dps_at_oom) {
            self.oom_at.push(at);
            self.dps_at_oom.push(dps);
        }
        if self.logs.is_empty() && !result.logs.is_empty() {
            self.logs = result.logs;
        }
    }

    /// Fold `other` in. Associative, so chunk results can be combined in
    /// any grouping; the caller keeps index order for reproducible floats.
    pub fn merge(&mut self, other: BatchAccumulator) {
        self.dps.merge(&other.dps);
        self.histogram.merge(&other.histogram);
        for (key, metrics) in &other.casts {
            self.casts.entry(key.clone()).or_default().merge(metrics);
        }
        for (key, uptime) in other.uptime_sums {
            *self.uptime_sums.entry(key).or_default() += uptime;
        }
        self.oom_at.merge(&other.oom_at);
        self.dps_at_oom.merge(&other.dps_at_oom);
        if self.logs.is_empty() {
            self.logs = other.logs;
        }
    }

    pub fn dps(&self) -> &RunningStats {
        &self.dps
    }

    pub fn into_output(self, requested: u32, aborted: bool, started: Instant) -> BatchOutput {
        let completed = self.dps.count();
        let debuff_uptime = self
            .uptime_sums
            .into_iter()
            .map(|(key, sum)| (key, if completed > 0 { sum / completed as f64 } else { 0.0 }))
            .collect();
        BatchOutput {
            iterations_requested: requested,
            iterations_completed: u32::try_from(completed).unwrap_or(u32::MAX),
            aborted,
            dps: DpsSummary {
                avg: self.dps.mean(),
                stdev: self.dps.stdev(),
                max: self.dps.max(),
                min: self.dps.min(),
                histogram: self.histogram.buckets(),
            },
            casts: self.casts,
            debuff_uptime,
            num_oom: u32::try_from(self.oom_at.count()).unwrap_or(u32::MAX),
            oom_at_avg: self.oom_at.mean(),
            dps_at_oom_avg: self.dps_at_oom.mean(),
            execution_duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            logs: self.logs,
        }
    }
}

/// Result of one chunk: what completed, and whether it stopped early.
struct ChunkOutcome {
    accumulator: BatchAccumulator,
    aborted: bool,
}

fn run_chunk(scenario: &Scenario, start: u32, end: u32, cancel: &CancelToken) -> Result<ChunkOutcome> {
    let mut accumulator = BatchAccumulator::new(scenario.options.histogram_bucket);
    for index in start..end {
        if cancel.is_cancelled() {
            return Ok(ChunkOutcome {
                accumulator,
                aborted: true,
            });
        }
        match scenario.run_iteration(index, cancel) {
            Ok(result) => accumulator.add(result),
            Err(SimError::Aborted) => {
                return Ok(ChunkOutcome {
                    accumulator,
                    aborted: true,
                })
            }
            Err(err) => return Err(err),
        }
    }
    Ok(ChunkOutcome {
        accumulator,
        aborted: false,
    })
}

fn run_chunks(scenario: &Scenario, cancel: &CancelToken) -> Result<(BatchAccumulator, bool)> {
    let iterations = scenario.options.iterations;
    let chunks: Vec<(u32, u32)> = (0..iterations)
        .step_by(CHUNK_SIZE as usize)
        .map(|start| (start, start.saturating_add(CHUNK_SIZE).min(iterations)))
        .collect();

    let outcomes: Vec<Result<ChunkOutcome>> = chunks
        .par_iter()
        .map(|&(start, end)| run_chunk(scenario, start, end, cancel))
        .collect();

    let mut total = BatchAccumulator::new(scenario.options.histogram_bucket);
    let mut aborted = false;
    for outcome in outcomes {
        let outcome = outcome?;
        aborted |= outcome.aborted;
        total.merge(outcome.accumulator);
    }
    Ok((total, aborted))
}

/// Run `scenario.options.iterations` iterations and aggregate them.
///
/// Cancellation (or the wall-clock budget) yields a partial output flagged
/// `aborted`; any other iteration error fails the whole batch.
pub fn run_batch(scenario: &Scenario, cancel: &CancelToken) -> Result<BatchOutput> {
    let options = &scenario.options;
    let started = Instant::now();
    let cancel = match options.wall_clock_budget() {
        Some(budget) => cancel.with_deadline(budget),
        None => cancel.clone(),
    };
    info!(
        iterations = options.iterations,
        seed = options.random_seed,
        workers = options.workers,
        "starting batch"
    );

    let (accumulator, aborted) = if options.workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()
            .map_err(|e| SimError::Config(format!("cannot start {} workers: {}", options.workers, e)))?;
        pool.install(|| run_chunks(scenario, &cancel))?
    } else {
        run_chunks(scenario, &cancel)?
    };

    let output = accumulator.into_output(options.iterations, aborted, started);
    if aborted {
        warn!(
            completed = output.iterations_completed,
            requested = output.iterations_requested,
            "batch aborted"
        );
    }
    info!(
        completed = output.iterations_completed,
        dps = output.dps.avg,
        elapsed_ms = output.execution_duration_ms,
        "batch finished"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(dps: f64, oom: Option<f64>) -> IterationResult {
        let mut casts = BTreeMap::new();
        casts.insert(
            "spell:1".to_string(),
            CastMetrics {
                casts: 10,
                damage: dps * 10.0,
                ..CastMetrics::default()
            },
        );
        IterationResult {
            seed: 0,
            duration_secs: 10.0,
            elapsed_secs: 10.0,
            total_damage: dps * 10.0,
            dps,
            oom_at_secs: oom,
            dps_at_oom: oom.map(|_| dps),
            casts,
            debuff_uptime: BTreeMap::from([("target0:Misery".to_string(), 0.5)]),
            logs: Vec::new(),
        }
    }

    #[test]
    fn test_accumulator_merge_matches_sequential() {
        let values = [100.0, 110.0, 90.0, 105.0];
        let mut sequential = BatchAccumulator::new(10.0);
        let mut left = BatchAccumulator::new(10.0);
        let mut right = BatchAccumulator::new(10.0);
        for (i, v) in values.iter().enumerate() {
            sequential.add(result(*v, None));
            if i < 2 {
                left.add(result(*v, None));
            } else {
                right.add(result(*v, None));
            }
        }
        left.merge(right);
        assert_eq!(left.completed(), 4);
        assert!((left.dps().mean() - sequential.dps().mean()).abs() < 1e-9);
        assert!((left.dps().stdev() - sequential.dps().stdev()).abs() < 1e-9);
        assert_eq!(left.casts["spell:1"].casts, 40);
    }

    #[test]
    fn test_output_oom_and_uptime_averages() {
        let mut acc = BatchAccumulator::new(10.0);
        acc.add(result(100.0, Some(60.0)));
        acc.add(result(200.0, None));
        acc.add(result(150.0, Some(80.0)));
        let output = acc.into_output(3, false, Instant::now());
        assert_eq!(output.iterations_completed, 3);
        assert_eq!(output.num_oom, 2);
        assert!((output.oom_at_avg - 70.0).abs() < 1e-9);
        assert!((output.dps_at_oom_avg - 125.0).abs() < 1e-9);
        assert!((output.debuff_uptime["target0:Misery"] - 0.5).abs() < 1e-9);
        assert_eq!(output.dps.max, 200.0);
        assert_eq!(output.dps.min, 100.0);
    }
}
