//! Armor mitigation for physical damage

use crate::combat::constants::{ATTACKER_LEVEL, MAX_ARMOR_REDUCTION};

/// Armor constant for an attacker of `level`.
pub fn armor_constant(level: f64) -> f64 {
    400.0 + 85.0 * (level + 4.5 * (level - 59.0))
}

/// Fraction of physical damage removed by `armor` after `armor_penetration`.
///
/// Effective armor never drops below zero and the reduction is capped at 75%.
pub fn armor_damage_reduction(armor: f64, armor_penetration: f64) -> f64 {
    let effective = (armor - armor_penetration).max(0.0);
    let reduction = effective / (effective + armor_constant(ATTACKER_LEVEL));
    reduction.clamp(0.0, MAX_ARMOR_REDUCTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_70_constant() {
        assert!((armor_constant(70.0) - 10557.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_armor_no_reduction() {
        assert_eq!(armor_damage_reduction(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_boss_armor() {
        let reduction = armor_damage_reduction(7684.0, 0.0);
        assert!((reduction - 7684.0 / (7684.0 + 10557.5)).abs() < 1e-12);
    }

    #[test]
    fn test_penetration_clamps_at_zero_armor() {
        assert_eq!(armor_damage_reduction(1000.0, 5000.0), 0.0);
    }

    #[test]
    fn test_reduction_capped() {
        assert_eq!(armor_damage_reduction(1.0e9, 0.0), MAX_ARMOR_REDUCTION);
    }
}
