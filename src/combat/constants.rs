//! Combat rule constants - all tunable values in one place
//!
//! Ratings convert to percentages at level 70 values.

use std::time::Duration;

// Rating conversions (rating per 1%)
pub const SPELL_HIT_RATING_PER_HIT_CHANCE: f64 = 12.6;
pub const SPELL_CRIT_RATING_PER_CRIT_CHANCE: f64 = 22.08;
pub const MELEE_HIT_RATING_PER_HIT_CHANCE: f64 = 15.77;
pub const MELEE_CRIT_RATING_PER_CRIT_CHANCE: f64 = 22.08;
pub const HASTE_RATING_PER_HASTE_PERCENT: f64 = 15.77;
pub const EXPERTISE_PER_QUARTER_PERCENT_REDUCTION: f64 = 3.9425;

// Spell hit table
pub const BASE_SPELL_HIT_CHANCE: f64 = 0.83;
pub const MAX_SPELL_HIT_CHANCE: f64 = 0.99;

// Melee hit table
pub const DUAL_WIELD_MISS_PENALTY: f64 = 0.19;
pub const GLANCE_DAMAGE_MULTIPLIER: f64 = 0.75;
pub const OFF_HAND_DAMAGE_MULTIPLIER: f64 = 0.5;

// Partial resist bands (cumulative roll thresholds, low rolls resist more)
pub const PARTIAL_RESIST_THRESHOLD: f64 = 0.18;
pub const PARTIAL_RESIST_2_4_THRESHOLD: f64 = 0.05;
pub const PARTIAL_RESIST_3_4_THRESHOLD: f64 = 0.01;

// Armor
pub const ATTACKER_LEVEL: f64 = 70.0;
pub const MAX_ARMOR_REDUCTION: f64 = 0.75;

// Timing
pub const GCD_DEFAULT: Duration = Duration::from_millis(1500);
pub const MAX_PROC_DEPTH: u8 = 8;
pub const MAX_OFF_GCD_ACTIONS_PER_STEP: usize = 8;

// Resources
pub const ENERGY_PER_SECOND: f64 = 10.0;
pub const MAX_ENERGY: f64 = 100.0;
pub const MAX_RAGE: f64 = 100.0;
pub const RAGE_CONVERSION_VALUE: f64 = 274.7;
pub const SPIRIT_REGEN_BASE: f64 = 0.001;
pub const SPIRIT_REGEN_COEFFICIENT: f64 = 0.009327;

/// Melee hit suppression against a target `level_diff` levels above the attacker.
pub fn hit_suppression(level_diff: u32) -> f64 {
    if level_diff >= 3 {
        0.01
    } else {
        0.0
    }
}

/// Base miss chance of a special attack against a target `level_diff` levels up.
pub fn base_miss_chance(level_diff: u32) -> f64 {
    match level_diff {
        0 => 0.05,
        1 => 0.055,
        2 => 0.06,
        _ => 0.08,
    }
}

pub fn base_dodge_chance(level_diff: u32) -> f64 {
    0.05 + 0.005 * level_diff.min(3) as f64
}

pub fn base_glance_chance(level_diff: u32) -> f64 {
    0.1 + 0.05 * level_diff.min(3) as f64
}

pub fn crit_suppression(level_diff: u32) -> f64 {
    match level_diff {
        0..=2 => 0.01 * level_diff as f64,
        _ => 0.048,
    }
}
