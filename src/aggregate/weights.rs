//! Stat weights and equivalence points
//!
//! Each weighed stat is perturbed by a small delta on the first character and
//! the whole batch is rerun with the same seed as the baseline (common random
//! numbers), so a stat that changes nothing yields exactly the baseline DPS.
//! The weight is `(dps(perturbed) - dps(baseline)) / delta`; EP values divide
//! every weight by the reference stat's weight.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::batch::run_batch;
use crate::aggregate::output::BatchOutput;
use crate::core::cancel::CancelToken;
use crate::core::error::{Result, SimError};
use crate::core::stats::Stat;
use crate::simulation::scenario::Scenario;

fn default_delta() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatWeightsRequest {
    pub stats_to_weigh: Vec<Stat>,
    pub ep_reference_stat: Stat,
    #[serde(default = "default_delta")]
    pub delta: f64,
    /// Per-stat overrides of `delta`.
    #[serde(default)]
    pub deltas: BTreeMap<Stat, f64>,
}

impl StatWeightsRequest {
    pub fn new(stats_to_weigh: Vec<Stat>, ep_reference_stat: Stat) -> Self {
        Self {
            stats_to_weigh,
            ep_reference_stat,
            delta: default_delta(),
            deltas: BTreeMap::new(),
        }
    }

    pub fn with_delta(mut self, stat: Stat, delta: f64) -> Self {
        self.deltas.insert(stat, delta);
        self
    }

    pub fn delta_for(&self, stat: Stat) -> f64 {
        self.deltas.get(&stat).copied().unwrap_or(self.delta)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stats_to_weigh.is_empty() {
            return Err(SimError::Config("no stats to weigh".into()));
        }
        for stat in self.stats_to_weigh.iter().chain(std::iter::once(&self.ep_reference_stat)) {
            let delta = self.delta_for(*stat);
            if !delta.is_finite() || delta == 0.0 {
                return Err(SimError::InvalidStat {
                    stat: format!("delta for {}", stat),
                    value: delta,
                });
            }
        }
        Ok(())
    }

    /// Batches to run: the baseline (`None`) then one per perturbed stat.
    /// The reference stat is added when it is not weighed itself.
    pub(crate) fn plan(&self) -> Vec<Option<Stat>> {
        let mut plan = vec![None];
        plan.extend(self.stats_to_weigh.iter().copied().map(Some));
        if !self.stats_to_weigh.contains(&self.ep_reference_stat) {
            plan.push(Some(self.ep_reference_stat));
        }
        plan
    }
}

/// Marginal value per point of stat, aligned with `stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatWeightsResult {
    pub stats: Vec<Stat>,
    pub ep_reference_stat: Stat,
    pub baseline_dps: f64,
    pub baseline_dps_stdev: f64,
    pub weights: Vec<f64>,
    pub weights_stdev: Vec<f64>,
    pub ep_values: Vec<f64>,
    pub ep_values_stdev: Vec<f64>,
}

impl StatWeightsResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// DPS change per point and its standard error.
fn weight(baseline: &BatchOutput, perturbed: &BatchOutput, delta: f64) -> (f64, f64) {
    let value = (perturbed.dps.avg - baseline.dps.avg) / delta;
    let error = (perturbed.dps_std_error().powi(2) + baseline.dps_std_error().powi(2)).sqrt()
        / delta.abs();
    (value, error)
}

/// Ratio `w / w_ref` with first-order error propagation.
pub fn equivalence_point(w: f64, w_stdev: f64, w_ref: f64, w_ref_stdev: f64) -> (f64, f64) {
    if w_ref == 0.0 || !w_ref.is_finite() {
        return (0.0, 0.0);
    }
    let ep = w / w_ref;
    let variance =
        w_stdev.powi(2) / w_ref.powi(2) + w.powi(2) * w_ref_stdev.powi(2) / w_ref.powi(4);
    (ep, variance.sqrt())
}

/// Combine the batches of `request.plan()` (same order) into weights and EPs.
pub(crate) fn assemble(
    request: &StatWeightsRequest,
    outputs: &[(Option<Stat>, BatchOutput)],
) -> Result<StatWeightsResult> {
    let baseline = outputs
        .iter()
        .find(|(stat, _)| stat.is_none())
        .map(|(_, out)| out)
        .ok_or_else(|| SimError::Config("stat weights need a baseline batch".into()))?;

    let mut by_stat: BTreeMap<Stat, (f64, f64)> = BTreeMap::new();
    for (stat, output) in outputs {
        if let Some(stat) = stat {
            by_stat.insert(*stat, weight(baseline, output, request.delta_for(*stat)));
        }
    }
    let lookup = |stat: Stat| {
        by_stat
            .get(&stat)
            .copied()
            .ok_or_else(|| SimError::Config(format!("no batch was run for {}", stat)))
    };

    let (w_ref, w_ref_stdev) = lookup(request.ep_reference_stat)?;
    if w_ref == 0.0 {
        warn!(stat = %request.ep_reference_stat, "reference stat has zero weight, EP values are zero");
    }

    let mut result = StatWeightsResult {
        stats: request.stats_to_weigh.clone(),
        ep_reference_stat: request.ep_reference_stat,
        baseline_dps: baseline.dps.avg,
        baseline_dps_stdev: baseline.dps.stdev,
        weights: Vec::with_capacity(request.stats_to_weigh.len()),
        weights_stdev: Vec::with_capacity(request.stats_to_weigh.len()),
        ep_values: Vec::with_capacity(request.stats_to_weigh.len()),
        ep_values_stdev: Vec::with_capacity(request.stats_to_weigh.len()),
    };
    for stat in &request.stats_to_weigh {
        let (w, w_stdev) = lookup(*stat)?;
        let (ep, ep_stdev) = equivalence_point(w, w_stdev, w_ref, w_ref_stdev);
        result.weights.push(w);
        result.weights_stdev.push(w_stdev);
        result.ep_values.push(ep);
        result.ep_values_stdev.push(ep_stdev);
    }
    Ok(result)
}

/// Run one batch of the plan; an aborted batch aborts the computation.
pub(crate) fn run_planned(
    scenario: &Scenario,
    request: &StatWeightsRequest,
    step: Option<Stat>,
    cancel: &CancelToken,
) -> Result<BatchOutput> {
    let output = match step {
        None => run_batch(scenario, cancel)?,
        Some(stat) => run_batch(&scenario.with_stat_delta(stat, request.delta_for(stat)), cancel)?,
    };
    if output.aborted {
        return Err(SimError::Aborted);
    }
    Ok(output)
}

/// Compute stat weights synchronously.
pub fn compute_stat_weights(
    scenario: &Scenario,
    request: &StatWeightsRequest,
    cancel: &CancelToken,
) -> Result<StatWeightsResult> {
    request.validate()?;
    let plan = request.plan();
    info!(stats = request.stats_to_weigh.len(), batches = plan.len(), "computing stat weights");

    let mut outputs = Vec::with_capacity(plan.len());
    for step in plan {
        let output = run_planned(scenario, request, step, cancel)?;
        outputs.push((step, output));
    }
    assemble(request, &outputs)
}
