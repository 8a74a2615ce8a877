//! Cumulative per-ability results

use serde::{Deserialize, Serialize};

use crate::combat::outcome::HitOutcome;

/// Counters folded from every effect of one ability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastMetrics {
    pub casts: u64,
    pub hits: u64,
    pub misses: u64,
    pub crits: u64,
    pub dodges: u64,
    pub glances: u64,
    pub parries: u64,
    pub blocks: u64,
    pub partial_resists_1_4: u64,
    pub partial_resists_2_4: u64,
    pub partial_resists_3_4: u64,
    pub damage: f64,
    pub threat: f64,
}

impl CastMetrics {
    pub fn record_cast(&mut self) {
        self.casts += 1;
    }

    /// Fold one resolved effect.
    pub fn record(&mut self, outcome: HitOutcome, damage: f64, threat: f64) {
        if outcome.contains(HitOutcome::HIT) {
            self.hits += 1;
        }
        if outcome.contains(HitOutcome::CRIT) {
            self.crits += 1;
        }
        if outcome.contains(HitOutcome::MISS) {
            self.misses += 1;
        }
        if outcome.contains(HitOutcome::DODGE) {
            self.dodges += 1;
        }
        if outcome.contains(HitOutcome::GLANCE) {
            self.glances += 1;
        }
        if outcome.contains(HitOutcome::PARRY) {
            self.parries += 1;
        }
        if outcome.contains(HitOutcome::BLOCK) {
            self.blocks += 1;
        }
        if outcome.contains(HitOutcome::PARTIAL_1_4) {
            self.partial_resists_1_4 += 1;
        }
        if outcome.contains(HitOutcome::PARTIAL_2_4) {
            self.partial_resists_2_4 += 1;
        }
        if outcome.contains(HitOutcome::PARTIAL_3_4) {
            self.partial_resists_3_4 += 1;
        }
        self.damage += damage;
        self.threat += threat;
    }

    pub fn merge(&mut self, other: &CastMetrics) {
        self.casts += other.casts;
        self.hits += other.hits;
        self.misses += other.misses;
        self.crits += other.crits;
        self.dodges += other.dodges;
        self.glances += other.glances;
        self.parries += other.parries;
        self.blocks += other.blocks;
        self.partial_resists_1_4 += other.partial_resists_1_4;
        self.partial_resists_2_4 += other.partial_resists_2_4;
        self.partial_resists_3_4 += other.partial_resists_3_4;
        self.damage += other.damage;
        self.threat += other.threat;
    }

    /// Effects that landed in any way.
    pub fn landed(&self) -> u64 {
        self.hits + self.crits + self.glances + self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_composite_outcome() {
        let mut metrics = CastMetrics::default();
        metrics.record(HitOutcome::CRIT | HitOutcome::PARTIAL_2_4, 150.0, 150.0);
        metrics.record(HitOutcome::MISS, 0.0, 0.0);

        assert_eq!(metrics.crits, 1);
        assert_eq!(metrics.partial_resists_2_4, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.landed(), 1);
        assert_eq!(metrics.damage, 150.0);
    }

    #[test]
    fn test_merge_sums_counters() {
        let mut a = CastMetrics::default();
        a.record_cast();
        a.record(HitOutcome::HIT, 100.0, 100.0);
        let mut b = a.clone();
        b.merge(&a);
        assert_eq!(b.casts, 2);
        assert_eq!(b.hits, 2);
        assert_eq!(b.damage, 200.0);
    }
}
