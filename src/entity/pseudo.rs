//! Derived multipliers that are not part of the stat vector

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::SpellSchool;

/// Talent and buff multipliers of one actor or target.
///
/// Dealt-side fields apply when the owner is the attacker, taken-side fields
/// when the owner is struck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PseudoStats {
    pub damage_dealt_multiplier: f64,
    pub school_damage_dealt_multiplier: [f64; SpellSchool::COUNT],
    pub ranged_damage_dealt_multiplier: f64,

    pub damage_taken_multiplier: f64,
    pub school_damage_taken_multiplier: [f64; SpellSchool::COUNT],
    pub periodic_physical_damage_taken_multiplier: f64,
    pub bonus_physical_damage_taken: f64,

    pub threat_multiplier: f64,
    pub bonus_weapon_damage: f64,

    /// Ratings granted to attackers of this owner.
    pub bonus_hit_rating_taken: f64,
    pub bonus_crit_rating_taken: f64,

    pub cast_speed_multiplier: f64,
    pub attack_speed_multiplier: f64,

    /// Fraction of spirit regeneration that continues while casting.
    pub spirit_regen_while_casting: f64,
}

impl Default for PseudoStats {
    fn default() -> Self {
        Self {
            damage_dealt_multiplier: 1.0,
            school_damage_dealt_multiplier: [1.0; SpellSchool::COUNT],
            ranged_damage_dealt_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            school_damage_taken_multiplier: [1.0; SpellSchool::COUNT],
            periodic_physical_damage_taken_multiplier: 1.0,
            bonus_physical_damage_taken: 0.0,
            threat_multiplier: 1.0,
            bonus_weapon_damage: 0.0,
            bonus_hit_rating_taken: 0.0,
            bonus_crit_rating_taken: 0.0,
            cast_speed_multiplier: 1.0,
            attack_speed_multiplier: 1.0,
            spirit_regen_while_casting: 0.0,
        }
    }
}

impl PseudoStats {
    /// Global × school (× ranged) dealt multiplier.
    pub fn damage_dealt(&self, school: SpellSchool, ranged: bool) -> f64 {
        let ranged = if ranged {
            self.ranged_damage_dealt_multiplier
        } else {
            1.0
        };
        self.damage_dealt_multiplier * self.school_damage_dealt_multiplier[school.index()] * ranged
    }

    /// Global, then school, then periodic-physical taken multiplier.
    pub fn damage_taken(&self, school: SpellSchool, periodic: bool) -> f64 {
        let periodic = if periodic && school.is_physical() {
            self.periodic_physical_damage_taken_multiplier
        } else {
            1.0
        };
        self.damage_taken_multiplier * self.school_damage_taken_multiplier[school.index()] * periodic
    }

    pub fn validate(&self) -> Result<()> {
        let multipliers = [
            ("damage_dealt_multiplier", self.damage_dealt_multiplier),
            ("ranged_damage_dealt_multiplier", self.ranged_damage_dealt_multiplier),
            ("damage_taken_multiplier", self.damage_taken_multiplier),
            (
                "periodic_physical_damage_taken_multiplier",
                self.periodic_physical_damage_taken_multiplier,
            ),
            ("threat_multiplier", self.threat_multiplier),
            ("cast_speed_multiplier", self.cast_speed_multiplier),
            ("attack_speed_multiplier", self.attack_speed_multiplier),
        ];
        let schools = self
            .school_damage_dealt_multiplier
            .iter()
            .chain(self.school_damage_taken_multiplier.iter())
            .map(|v| ("school multiplier", *v));

        for (name, value) in multipliers.into_iter().chain(schools) {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(SimError::Config(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        if self.cast_speed_multiplier == 0.0 || self.attack_speed_multiplier == 0.0 {
            return Err(SimError::Config("speed multipliers must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.spirit_regen_while_casting) {
            return Err(SimError::Config(
                "spirit_regen_while_casting must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dealt_multiplier_composes() {
        let mut pseudo = PseudoStats::default();
        pseudo.damage_dealt_multiplier = 1.1;
        pseudo.school_damage_dealt_multiplier[SpellSchool::Shadow.index()] = 1.2;
        pseudo.ranged_damage_dealt_multiplier = 1.5;

        assert!((pseudo.damage_dealt(SpellSchool::Shadow, false) - 1.32).abs() < 1e-12);
        assert!((pseudo.damage_dealt(SpellSchool::Fire, false) - 1.1).abs() < 1e-12);
        assert!((pseudo.damage_dealt(SpellSchool::Physical, true) - 1.65).abs() < 1e-12);
    }

    #[test]
    fn test_periodic_physical_only_for_physical_ticks() {
        let mut pseudo = PseudoStats::default();
        pseudo.periodic_physical_damage_taken_multiplier = 1.3;
        assert_eq!(pseudo.damage_taken(SpellSchool::Physical, false), 1.0);
        assert!((pseudo.damage_taken(SpellSchool::Physical, true) - 1.3).abs() < 1e-12);
        assert_eq!(pseudo.damage_taken(SpellSchool::Shadow, true), 1.0);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut pseudo = PseudoStats::default();
        assert!(pseudo.validate().is_ok());
        pseudo.threat_multiplier = f64::NAN;
        assert!(pseudo.validate().is_err());
    }
}
