//! Encounter targets: armor, defensive chances and debuffs

use serde::{Deserialize, Serialize};

use crate::aura::definition::ModScope;
use crate::aura::set::AuraSet;
use crate::combat::constants::ATTACKER_LEVEL;
use crate::core::config::Encounter;
use crate::core::error::{Result, SimError};
use crate::core::stats::{Stat, StatBlock, Stats};
use crate::core::types::{SpellSchool, TargetIndex};
use crate::entity::pseudo::PseudoStats;

/// Defensive chances that do not derive from level.
///
/// Bosses attacked from behind neither parry nor block, so both default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDefense {
    pub parry_chance: f64,
    pub block_chance: f64,
    pub block_value: f64,
}

impl TargetDefense {
    pub fn validate(&self) -> Result<()> {
        for (name, chance) in [("parry_chance", self.parry_chance), ("block_chance", self.block_chance)] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(SimError::Config(format!("{} ({}) must be within [0, 1]", name, chance)));
            }
        }
        if !(self.block_value >= 0.0) || !self.block_value.is_finite() {
            return Err(SimError::Config("block_value must be non-negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Target {
    pub index: TargetIndex,
    pub level: u32,
    pub stats: StatBlock,
    pub pseudo: PseudoStats,
    pub auras: AuraSet,
    pub defense: TargetDefense,
    /// Damage taken so far this iteration.
    pub damage_taken: f64,
}

impl Target {
    pub fn new(index: TargetIndex, encounter: &Encounter) -> Self {
        Self {
            index,
            level: encounter.target_level,
            stats: StatBlock::new(Stats::new().with(Stat::Armor, encounter.target_armor), Vec::new()),
            pseudo: PseudoStats::default(),
            auras: AuraSet::new(),
            defense: encounter.target_defense,
            damage_taken: 0.0,
        }
    }

    /// Levels above the attacker; never negative.
    pub fn level_diff(&self) -> u32 {
        self.level.saturating_sub(ATTACKER_LEVEL as u32)
    }

    pub fn armor(&self) -> f64 {
        self.stats.get(Stat::Armor)
    }

    /// Incoming multiplier for `school`: pseudo stats then aura modifiers.
    pub fn damage_taken_multiplier(&self, school: SpellSchool, periodic: bool) -> f64 {
        let mut multiplier = self.pseudo.damage_taken(school, periodic)
            * self.auras.multiplier(ModScope::DamageTaken, school);
        if periodic {
            multiplier *= self.auras.multiplier(ModScope::PeriodicDamageTaken, school);
        }
        multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::definition::{AuraDef, MultiplierMod};
    use crate::core::types::{AuraId, SchoolMask, SimTime};

    #[test]
    fn test_new_target_from_encounter() {
        let target = Target::new(TargetIndex(2), &Encounter::default());
        assert_eq!(target.index, TargetIndex(2));
        assert_eq!(target.level_diff(), 3);
        assert_eq!(target.armor(), 7684.0);
    }

    #[test]
    fn test_armor_debuff_lowers_armor() {
        let mut target = Target::new(TargetIndex::PRIMARY, &Encounter::default());
        let sunder = AuraDef::new(AuraId(1), "Sunder Armor")
            .with_max_stacks(5)
            .with_stat(Stat::Armor, -520.0)
            .into_shared();
        target.auras.apply(&mut target.stats, &sunder, SimTime::ZERO, Some(5));
        assert_eq!(target.armor(), 7684.0 - 2600.0);
    }

    #[test]
    fn test_taken_multiplier_includes_auras() {
        let mut target = Target::new(TargetIndex::PRIMARY, &Encounter::default());
        let misery = AuraDef::new(AuraId(1), "Misery")
            .with_multiplier(MultiplierMod::damage_taken(SchoolMask::MAGIC, 1.05))
            .into_shared();
        target.auras.apply(&mut target.stats, &misery, SimTime::ZERO, None);
        target.pseudo.school_damage_taken_multiplier[SpellSchool::Fire.index()] = 1.1;

        let fire = target.damage_taken_multiplier(SpellSchool::Fire, false);
        assert!((fire - 1.155).abs() < 1e-12);
        assert_eq!(target.damage_taken_multiplier(SpellSchool::Physical, false), 1.0);
    }
}
