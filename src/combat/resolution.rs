//! Outcome rolls and the pure arithmetic of the damage pipeline
//!
//! Everything here is a function of its inputs plus named RNG draws; the
//! stateful orchestration (hooks, procs, metrics) lives in the simulation.

use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    BASE_SPELL_HIT_CHANCE, EXPERTISE_PER_QUARTER_PERCENT_REDUCTION, GLANCE_DAMAGE_MULTIPLIER,
    MAX_SPELL_HIT_CHANCE, MELEE_CRIT_RATING_PER_CRIT_CHANCE, MELEE_HIT_RATING_PER_HIT_CHANCE,
    PARTIAL_RESIST_2_4_THRESHOLD, PARTIAL_RESIST_3_4_THRESHOLD, PARTIAL_RESIST_THRESHOLD,
    SPELL_CRIT_RATING_PER_CRIT_CHANCE, SPELL_HIT_RATING_PER_HIT_CHANCE,
};
use crate::combat::outcome::{HitOutcome, OutcomeRollCategory};
use crate::core::rng::RandomSource;

pub const MAGIC_HIT_LABEL: &str = "Magical Hit Roll";
pub const MAGIC_CRIT_LABEL: &str = "Magical Crit Roll";
pub const PHYSICAL_HIT_LABEL: &str = "Physical Hit Roll";
pub const PHYSICAL_CRIT_LABEL: &str = "Physical Crit Roll";
pub const PARTIAL_RESIST_LABEL: &str = "Partial Resist";

/// Magic hit chance: 83% plus rating, capped at 99%.
pub fn magic_hit_chance(hit_rating: f64) -> f64 {
    (BASE_SPELL_HIT_CHANCE + hit_rating / (SPELL_HIT_RATING_PER_HIT_CHANCE * 100.0))
        .clamp(0.0, MAX_SPELL_HIT_CHANCE)
}

pub fn magic_crit_chance(crit_rating: f64) -> f64 {
    (crit_rating / (SPELL_CRIT_RATING_PER_CRIT_CHANCE * 100.0)).max(0.0)
}

pub fn melee_hit_chance(hit_rating: f64) -> f64 {
    (hit_rating / (MELEE_HIT_RATING_PER_HIT_CHANCE * 100.0)).max(0.0)
}

pub fn melee_crit_chance(crit_rating: f64) -> f64 {
    (crit_rating / (MELEE_CRIT_RATING_PER_CRIT_CHANCE * 100.0)).max(0.0)
}

/// Dodge removed by expertise, in quarter-percent steps, never more than `dodge`.
pub fn expertise_dodge_reduction(expertise: f64, dodge: f64) -> f64 {
    let steps = (expertise.max(0.0) / EXPERTISE_PER_QUARTER_PERCENT_REDUCTION).floor();
    (steps / 400.0).min(dodge.max(0.0))
}

/// Band widths of one physical attack against one target.
///
/// Widths are clamped at zero; whatever the bands leave of `[0, 1)` is a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackTable {
    pub miss: f64,
    pub dodge: f64,
    pub parry: f64,
    pub block: f64,
    pub glance: f64,
    pub crit: f64,
}

impl AttackTable {
    fn width(value: f64) -> f64 {
        if value.is_finite() {
            value.max(0.0)
        } else {
            0.0
        }
    }

    /// Outcome for `roll` in `[0, 1)`.
    ///
    /// Bands are laid out cumulatively in the fixed order miss, dodge, parry,
    /// block, then (auto-attacks only) glance and crit. The first cumulative
    /// threshold exceeding the roll wins. Special attacks stop after block and
    /// ranged attacks after miss; both roll crit separately.
    pub fn outcome_for(&self, roll: f64, category: OutcomeRollCategory, can_dodge: bool) -> HitOutcome {
        let mut threshold = Self::width(self.miss);
        if roll < threshold {
            return HitOutcome::MISS;
        }
        if category == OutcomeRollCategory::Ranged {
            return HitOutcome::HIT;
        }

        if can_dodge {
            threshold += Self::width(self.dodge);
            if roll < threshold {
                return HitOutcome::DODGE;
            }
        }

        threshold += Self::width(self.parry);
        if roll < threshold {
            return HitOutcome::PARRY;
        }

        threshold += Self::width(self.block);
        if roll < threshold {
            return HitOutcome::BLOCK;
        }

        if category != OutcomeRollCategory::White {
            return HitOutcome::HIT;
        }

        threshold += Self::width(self.glance);
        if roll < threshold {
            return HitOutcome::GLANCE;
        }

        threshold += Self::width(self.crit);
        if roll < threshold {
            return HitOutcome::CRIT;
        }

        HitOutcome::HIT
    }
}

/// Spell hit roll on its own stream.
pub fn roll_spell_hit(rng: &mut RandomSource, hit_chance: f64) -> bool {
    rng.random_float(MAGIC_HIT_LABEL) < hit_chance
}

/// Two independent rolls: hit, then crit.
pub fn roll_magic(rng: &mut RandomSource, hit_chance: f64, crit_chance: f64) -> HitOutcome {
    if !roll_spell_hit(rng, hit_chance) {
        return HitOutcome::MISS;
    }
    if roll_crit(rng, MAGIC_CRIT_LABEL, crit_chance) {
        HitOutcome::CRIT
    } else {
        HitOutcome::HIT
    }
}

/// Physical roll on the attack table, plus the separate crit roll that
/// special and ranged attacks make once they connect.
pub fn roll_physical(
    rng: &mut RandomSource,
    table: &AttackTable,
    category: OutcomeRollCategory,
    can_dodge: bool,
) -> HitOutcome {
    let roll = rng.random_float(PHYSICAL_HIT_LABEL);
    let outcome = table.outcome_for(roll, category, can_dodge);
    if outcome == HitOutcome::HIT
        && category != OutcomeRollCategory::White
        && roll_crit(rng, PHYSICAL_CRIT_LABEL, table.crit)
    {
        return HitOutcome::CRIT;
    }
    outcome
}

/// True with probability `chance`; certain outcomes do not consume a draw.
pub fn roll_crit(rng: &mut RandomSource, label: &str, chance: f64) -> bool {
    if chance <= 0.0 {
        return false;
    }
    if chance >= 1.0 {
        return true;
    }
    rng.random_float(label) < chance
}

/// Partial-resist band for `roll`: the tag to add and the surviving fraction.
pub fn partial_resist_band(roll: f64) -> (HitOutcome, f64) {
    if roll > PARTIAL_RESIST_THRESHOLD {
        (HitOutcome::NONE, 1.0)
    } else if roll > PARTIAL_RESIST_2_4_THRESHOLD {
        (HitOutcome::PARTIAL_1_4, 0.75)
    } else if roll > PARTIAL_RESIST_3_4_THRESHOLD {
        (HitOutcome::PARTIAL_2_4, 0.5)
    } else {
        (HitOutcome::PARTIAL_3_4, 0.25)
    }
}

pub fn roll_partial_resist(rng: &mut RandomSource) -> (HitOutcome, f64) {
    partial_resist_band(rng.random_float(PARTIAL_RESIST_LABEL))
}

/// Final-stage multiplier from the decided outcome.
pub fn outcome_multiplier(outcome: HitOutcome, crit_multiplier: f64) -> f64 {
    if !outcome.landed() {
        0.0
    } else if outcome.contains(HitOutcome::CRIT) {
        crit_multiplier
    } else if outcome.base() == HitOutcome::GLANCE {
        GLANCE_DAMAGE_MULTIPLIER
    } else {
        1.0
    }
}

/// `(damage + flat) × multiplier`, zero unless the effect landed.
pub fn threat(damage: f64, flat_bonus: f64, multiplier: f64, landed: bool) -> f64 {
    if landed {
        (damage + flat_bonus) * multiplier
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AttackTable {
        AttackTable {
            miss: 0.1,
            dodge: 0.1,
            parry: 0.1,
            block: 0.1,
            glance: 0.1,
            crit: 0.1,
        }
    }

    #[test]
    fn test_magic_hit_chance_capped() {
        assert!((magic_hit_chance(0.0) - 0.83).abs() < 1e-12);
        assert!((magic_hit_chance(126.0) - 0.93).abs() < 1e-12);
        assert_eq!(magic_hit_chance(10_000.0), 0.99);
    }

    #[test]
    fn test_white_table_band_order() {
        let t = table();
        let white = OutcomeRollCategory::White;
        assert_eq!(t.outcome_for(0.05, white, true), HitOutcome::MISS);
        assert_eq!(t.outcome_for(0.15, white, true), HitOutcome::DODGE);
        assert_eq!(t.outcome_for(0.25, white, true), HitOutcome::PARRY);
        assert_eq!(t.outcome_for(0.35, white, true), HitOutcome::BLOCK);
        assert_eq!(t.outcome_for(0.45, white, true), HitOutcome::GLANCE);
        assert_eq!(t.outcome_for(0.55, white, true), HitOutcome::CRIT);
        assert_eq!(t.outcome_for(0.65, white, true), HitOutcome::HIT);
    }

    #[test]
    fn test_cannot_be_dodged_shifts_bands() {
        let t = table();
        let white = OutcomeRollCategory::White;
        assert_eq!(t.outcome_for(0.15, white, false), HitOutcome::PARRY);
    }

    #[test]
    fn test_special_and_ranged_stop_early() {
        let t = table();
        assert_eq!(t.outcome_for(0.45, OutcomeRollCategory::Special, true), HitOutcome::HIT);
        assert_eq!(t.outcome_for(0.15, OutcomeRollCategory::Ranged, true), HitOutcome::HIT);
        assert_eq!(t.outcome_for(0.05, OutcomeRollCategory::Ranged, true), HitOutcome::MISS);
    }

    #[test]
    fn test_negative_bands_have_no_width() {
        let t = AttackTable {
            miss: -0.2,
            crit: 1.5,
            ..AttackTable::default()
        };
        assert_eq!(t.outcome_for(0.0, OutcomeRollCategory::White, true), HitOutcome::CRIT);
    }

    #[test]
    fn test_partial_resist_bands() {
        assert_eq!(partial_resist_band(0.5), (HitOutcome::NONE, 1.0));
        assert_eq!(partial_resist_band(0.18), (HitOutcome::PARTIAL_1_4, 0.75));
        assert_eq!(partial_resist_band(0.05), (HitOutcome::PARTIAL_2_4, 0.5));
        assert_eq!(partial_resist_band(0.0), (HitOutcome::PARTIAL_3_4, 0.25));
    }

    #[test]
    fn test_outcome_multiplier() {
        assert_eq!(outcome_multiplier(HitOutcome::MISS, 2.0), 0.0);
        assert_eq!(outcome_multiplier(HitOutcome::HIT, 2.0), 1.0);
        assert_eq!(outcome_multiplier(HitOutcome::CRIT | HitOutcome::PARTIAL_1_4, 1.5), 1.5);
        assert_eq!(outcome_multiplier(HitOutcome::GLANCE, 2.0), 0.75);
    }

    #[test]
    fn test_threat_zero_when_not_landed() {
        assert_eq!(threat(100.0, 50.0, 1.5, false), 0.0);
        assert_eq!(threat(100.0, 50.0, 1.5, true), 225.0);
    }

    #[test]
    fn test_expertise_capped_by_dodge() {
        assert!((expertise_dodge_reduction(3.9425 * 4.0, 0.065) - 0.01).abs() < 1e-12);
        assert_eq!(expertise_dodge_reduction(10_000.0, 0.065), 0.065);
        assert_eq!(expertise_dodge_reduction(3.0, 0.065), 0.0);
    }

    #[test]
    fn test_certain_crit_skips_draw() {
        let mut rng = RandomSource::new(1);
        assert!(roll_crit(&mut rng, MAGIC_CRIT_LABEL, 1.0));
        assert!(!roll_crit(&mut rng, MAGIC_CRIT_LABEL, 0.0));
        assert_eq!(rng.draws(), 0);
    }
}
