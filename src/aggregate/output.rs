//! Batch output and serialization

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::metrics::CastMetrics;
use crate::core::error::Result;

/// Distribution of per-iteration DPS.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DpsSummary {
    pub avg: f64,
    pub stdev: f64,
    pub max: f64,
    pub min: f64,
    /// `(bucket lower bound, iterations)` in ascending order.
    pub histogram: Vec<(f64, u64)>,
}

/// Everything a batch of iterations produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutput {
    pub iterations_requested: u32,
    pub iterations_completed: u32,
    /// Cancelled or over the wall-clock budget; aggregates cover only the
    /// completed iterations.
    pub aborted: bool,
    pub dps: DpsSummary,
    /// Totals over all completed iterations, keyed by action id.
    pub casts: BTreeMap<String, CastMetrics>,
    /// Mean uptime fraction per `target:debuff`.
    pub debuff_uptime: BTreeMap<String, f64>,
    pub num_oom: u32,
    pub oom_at_avg: f64,
    pub dps_at_oom_avg: f64,
    pub execution_duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

impl BatchOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Standard error of the mean DPS.
    pub fn dps_std_error(&self) -> f64 {
        if self.iterations_completed == 0 {
            0.0
        } else {
            self.dps.stdev / f64::from(self.iterations_completed).sqrt()
        }
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} iterations: {:.1} dps (stdev {:.1}, min {:.1}, max {:.1}) in {} ms",
            self.iterations_completed,
            self.dps.avg,
            self.dps.stdev,
            self.dps.min,
            self.dps.max,
            self.execution_duration_ms
        );
        if self.num_oom > 0 {
            line.push_str(&format!(
                ", {} went oom at {:.1}s avg ({:.1} dps before)",
                self.num_oom, self.oom_at_avg, self.dps_at_oom_avg
            ));
        }
        if self.aborted {
            line.push_str(", aborted");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_oom_and_abort() {
        let output = BatchOutput {
            iterations_requested: 10,
            iterations_completed: 4,
            aborted: true,
            num_oom: 2,
            oom_at_avg: 95.0,
            dps_at_oom_avg: 1200.0,
            ..BatchOutput::default()
        };
        let summary = output.summary();
        assert!(summary.starts_with("4 iterations"));
        assert!(summary.contains("2 went oom"));
        assert!(summary.ends_with("aborted"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut output = BatchOutput {
            iterations_requested: 1,
            iterations_completed: 1,
            ..BatchOutput::default()
        };
        output.casts.insert("spell:1".into(), CastMetrics::default());
        let json = output.to_json().unwrap();
        let back: BatchOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, output);
    }
}
