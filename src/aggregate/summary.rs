//! Streaming statistics over iteration results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mean and variance in one pass (Welford), mergeable across chunks (Chan).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let total = self.count + other.count;
        let delta = other.mean - self.mean;
        self.m2 += other.m2 + delta * delta * (self.count as f64 * other.count as f64) / total as f64;
        self.mean += delta * other.count as f64 / total as f64;
        self.count = total;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation; zero below two samples.
    pub fn stdev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0).sqrt()
        }
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.stdev() / (self.count as f64).sqrt()
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Fixed-width buckets keyed by their lower bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bucket: f64,
    counts: BTreeMap<i64, u64>,
}

impl Histogram {
    pub fn new(bucket: f64) -> Self {
        Self {
            bucket,
            counts: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, value: f64) {
        if !value.is_finite() || self.bucket <= 0.0 {
            return;
        }
        let key = (value / self.bucket).floor() as i64;
        *self.counts.entry(key).or_default() += 1;
    }

    pub fn merge(&mut self, other: &Histogram) {
        for (key, count) in &other.counts {
            *self.counts.entry(*key).or_default() += count;
        }
    }

    /// `(lower bound, count)` pairs in ascending order.
    pub fn buckets(&self) -> Vec<(f64, u64)> {
        self.counts
            .iter()
            .map(|(key, count)| (*key as f64 * self.bucket, *count))
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats_matches_direct() {
        let values = [10.0, 12.0, 9.0, 15.0, 11.0];
        let mut stats = RunningStats::new();
        for v in values {
            stats.push(v);
        }
        let mean = values.iter().sum::<f64>() / 5.0;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 5.0;
        assert!((stats.mean() - mean).abs() < 1e-12);
        assert!((stats.stdev() - var.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min(), 9.0);
        assert_eq!(stats.max(), 15.0);
    }

    #[test]
    fn test_merge_equals_sequential() {
        let mut all = RunningStats::new();
        let mut left = RunningStats::new();
        let mut right = RunningStats::new();
        for i in 0..50 {
            let v = (i as f64 * 7.3) % 13.0;
            all.push(v);
            if i < 20 {
                left.push(v);
            } else {
                right.push(v);
            }
        }
        left.merge(&right);
        assert_eq!(left.count(), all.count());
        assert!((left.mean() - all.mean()).abs() < 1e-9);
        assert!((left.stdev() - all.stdev()).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_buckets() {
        let mut hist = Histogram::new(10.0);
        for v in [1.0, 9.9, 10.0, 25.0] {
            hist.push(v);
        }
        assert_eq!(hist.buckets(), vec![(0.0, 2), (10.0, 1), (20.0, 1)]);
        assert_eq!(hist.total(), 4);
    }
}
