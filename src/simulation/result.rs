//! Per-iteration output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::metrics::CastMetrics;
use crate::core::error::Result;
use crate::simulation::Simulation;

/// What one iteration produced. Serializes deterministically: maps are
/// ordered and every field is derived from the seed alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    pub seed: u64,
    pub duration_secs: f64,
    /// Simulated time actually covered; shorter than the duration when the
    /// iteration ended on out-of-mana.
    pub elapsed_secs: f64,
    pub total_damage: f64,
    pub dps: f64,
    /// First time the primary character ran out of mana.
    pub oom_at_secs: Option<f64>,
    pub dps_at_oom: Option<f64>,
    /// Keyed by action id (`spell:27209`, `other:1#2`).
    pub casts: BTreeMap<String, CastMetrics>,
    /// Fraction of the elapsed time each debuff was up, keyed `target0:Label`.
    pub debuff_uptime: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

impl IterationResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Simulation {
    pub(super) fn finish(self) -> IterationResult {
        let elapsed = self.now.as_secs_f64();
        let dps = if elapsed > 0.0 { self.total_damage / elapsed } else { 0.0 };

        let (oom_at_secs, dps_at_oom) = match self.actors.first().and_then(|a| a.oom_at.map(|t| (a, t))) {
            Some((actor, at)) => {
                let at = at.as_secs_f64();
                let dps = if at > 0.0 { actor.damage_at_oom / at } else { 0.0 };
                (Some(at), Some(dps))
            }
            None => (None, None),
        };

        let casts = self
            .metrics
            .iter()
            .map(|(id, metrics)| (id.key(), metrics.clone()))
            .collect();

        let mut debuff_uptime = BTreeMap::new();
        if elapsed > 0.0 {
            for target in &self.targets {
                for (def, uptime) in target.auras.uptimes(self.now) {
                    if def.is_debuff {
                        let key = format!("{}:{}", target.index, def.label);
                        debuff_uptime.insert(key, (uptime.as_secs_f64() / elapsed).min(1.0));
                    }
                }
            }
        }

        IterationResult {
            seed: self.seed,
            duration_secs: self.duration.as_secs_f64(),
            elapsed_secs: elapsed,
            total_damage: self.total_damage,
            dps,
            oom_at_secs,
            dps_at_oom,
            casts,
            debuff_uptime,
            logs: self.log.unwrap_or_default(),
        }
    }
}
