//! Character inputs
//!
//! Gear, consumables and talents arrive already folded into the stat
//! vector, pseudo stats and permanent auras. Rotations and aura hooks are
//! trait objects, so characters are built in code rather than loaded.

use std::collections::HashSet;
use std::sync::Arc;

use crate::aura::definition::AuraDef;
use crate::combat::ability::AbilityDef;
use crate::core::error::{Result, SimError};
use crate::core::stats::{Stat, StatDependency, Stats};
use crate::entity::pseudo::PseudoStats;
use crate::entity::resources::ResourceConfig;
use crate::entity::weapons::Weapons;
use crate::rotation::Rotation;

#[derive(Debug, Clone)]
pub struct CharacterConfig {
    pub name: String,
    pub base_stats: Stats,
    pub dependencies: Vec<StatDependency>,
    pub pseudo: PseudoStats,
    pub resources: ResourceConfig,
    pub abilities: Vec<Arc<AbilityDef>>,
    /// Active for the whole encounter from `t = 0`.
    pub permanent_auras: Vec<Arc<AuraDef>>,
    pub weapons: Weapons,
    pub rotation: Arc<dyn Rotation>,
}

impl CharacterConfig {
    pub fn new(name: impl Into<String>, rotation: impl Rotation + 'static) -> Self {
        Self {
            name: name.into(),
            base_stats: Stats::new(),
            dependencies: Vec::new(),
            pseudo: PseudoStats::default(),
            resources: ResourceConfig::default(),
            abilities: Vec::new(),
            permanent_auras: Vec::new(),
            weapons: Weapons::default(),
            rotation: Arc::new(rotation),
        }
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.base_stats = stats;
        self
    }

    pub fn with_stat(mut self, stat: Stat, value: f64) -> Self {
        self.base_stats[stat] = value;
        self
    }

    pub fn with_dependency(mut self, dependency: StatDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_pseudo(mut self, pseudo: PseudoStats) -> Self {
        self.pseudo = pseudo;
        self
    }

    pub fn with_resources(mut self, resources: ResourceConfig) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_ability(mut self, ability: AbilityDef) -> Self {
        self.abilities.push(ability.into_shared());
        self
    }

    pub fn with_aura(mut self, aura: Arc<AuraDef>) -> Self {
        self.permanent_auras.push(aura);
        self
    }

    pub fn with_weapons(mut self, weapons: Weapons) -> Self {
        self.weapons = weapons;
        self
    }

    /// Copy with one base stat shifted; used by stat-weight batches.
    pub fn with_stat_delta(&self, stat: Stat, delta: f64) -> Self {
        let mut config = self.clone();
        config.base_stats[stat] += delta;
        config
    }

    /// Reject anything that would make an iteration meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SimError::Config("character name must not be empty".into()));
        }
        self.base_stats.validate()?;
        self.pseudo.validate()?;
        self.weapons.validate()?;
        if !(0.0..=100.0).contains(&self.resources.starting_rage) {
            return Err(SimError::Config("starting_rage must be within [0, 100]".into()));
        }

        let mut seen = HashSet::new();
        let auto_ids = self.weapons.swinging_hands().into_iter().map(|h| h.auto_attack_id());
        for id in self.abilities.iter().map(|a| a.id).chain(auto_ids) {
            if !seen.insert(id) {
                return Err(SimError::Config(format!(
                    "character '{}' has two abilities with id {}",
                    self.name, id
                )));
            }
        }
        for ability in &self.abilities {
            ability.validate()?;
        }
        for aura in &self.permanent_auras {
            aura.validate()?;
        }
        for id in self.rotation.referenced_abilities() {
            if !seen.contains(&id) {
                return Err(SimError::MissingAbility(format!(
                    "rotation of '{}' uses {} which is not configured",
                    self.name, id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::ability::{AbilityKind, DamageSpec, DirectDamage};
    use crate::core::types::{ActionId, SpellSchool};
    use crate::rotation::{PriorityEntry, PriorityRotation};

    fn fireball() -> AbilityDef {
        AbilityDef::new(
            ActionId::spell(27070),
            "Fireball",
            SpellSchool::Fire,
            AbilityKind::Direct(DirectDamage {
                damage: DamageSpec::magic(649.0, 821.0, 1.0),
            }),
        )
    }

    #[test]
    fn test_valid_config() {
        let rotation = PriorityRotation::new(vec![PriorityEntry::always(ActionId::spell(27070))]);
        let config = CharacterConfig::new("Mage", rotation).with_ability(fireball());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rotation_with_unknown_ability_rejected() {
        let rotation = PriorityRotation::new(vec![PriorityEntry::always(ActionId::spell(1))]);
        let config = CharacterConfig::new("Mage", rotation).with_ability(fireball());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SimError::MissingAbility(_)));
        assert!(err.is_config());
    }

    #[test]
    fn test_bad_stats_rejected() {
        let rotation = PriorityRotation::new(Vec::new());
        let config = CharacterConfig::new("Mage", rotation).with_stat(Stat::Intellect, f64::NAN);
        assert!(matches!(config.validate(), Err(SimError::InvalidStat { .. })));
    }

    #[test]
    fn test_duplicate_ability_rejected() {
        let rotation = PriorityRotation::new(Vec::new());
        let config = CharacterConfig::new("Mage", rotation)
            .with_ability(fireball())
            .with_ability(fireball());
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_stat_delta_leaves_original() {
        let rotation = PriorityRotation::new(Vec::new());
        let config = CharacterConfig::new("Mage", rotation).with_stat(Stat::SpellPower, 1000.0);
        let shifted = config.with_stat_delta(Stat::SpellPower, 50.0);
        assert_eq!(config.base_stats[Stat::SpellPower], 1000.0);
        assert_eq!(shifted.base_stats[Stat::SpellPower], 1050.0);
    }
}
