//! Aura definitions: identity, timing, stacking and passive modifiers

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aura::hooks::AuraHooks;
use crate::core::error::{Result, SimError};
use crate::core::stats::{Stat, Stats};
use crate::core::types::{AuraId, SchoolMask, SimTime, SpellSchool};

/// Which multiplier a [`MultiplierMod`] feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModScope {
    DamageDealt,
    DamageTaken,
    PeriodicDamageTaken,
    Threat,
    CastSpeed,
    AttackSpeed,
}

/// A flat multiplicative modifier held while the aura is active.
///
/// Applies once regardless of stack count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierMod {
    pub scope: ModScope,
    pub schools: SchoolMask,
    pub value: f64,
}

impl MultiplierMod {
    pub fn new(scope: ModScope, schools: SchoolMask, value: f64) -> Self {
        Self { scope, schools, value }
    }

    pub fn damage_taken(schools: SchoolMask, value: f64) -> Self {
        Self::new(ModScope::DamageTaken, schools, value)
    }

    pub fn damage_dealt(schools: SchoolMask, value: f64) -> Self {
        Self::new(ModScope::DamageDealt, schools, value)
    }

    pub fn applies(&self, scope: ModScope, school: SpellSchool) -> bool {
        self.scope == scope && self.schools.contains(school)
    }
}

/// Static description of an aura. Shared between iterations behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AuraDef {
    pub id: AuraId,
    pub label: String,
    /// `None` lasts for the whole encounter.
    pub duration: Option<SimTime>,
    /// 1 for non-stacking auras.
    pub max_stacks: u32,
    pub stats_per_stack: Stats,
    pub multipliers: Vec<MultiplierMod>,
    pub hooks: Option<Arc<dyn AuraHooks>>,
    /// Counted in per-target debuff uptime.
    pub is_debuff: bool,
}

impl AuraDef {
    pub fn new(id: AuraId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            duration: None,
            max_stacks: 1,
            stats_per_stack: Stats::new(),
            multipliers: Vec::new(),
            hooks: None,
            is_debuff: false,
        }
    }

    pub fn with_duration(mut self, duration: SimTime) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn with_stat(mut self, stat: Stat, per_stack: f64) -> Self {
        self.stats_per_stack[stat] += per_stack;
        self
    }

    pub fn with_multiplier(mut self, modifier: MultiplierMod) -> Self {
        self.multipliers.push(modifier);
        self
    }

    pub fn with_hooks(mut self, hooks: impl AuraHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn debuff(mut self) -> Self {
        self.is_debuff = true;
        self
    }

    pub fn is_stacking(&self) -> bool {
        self.max_stacks > 1
    }

    pub fn is_permanent(&self) -> bool {
        self.duration.is_none()
    }

    pub fn into_shared(self) -> Arc<AuraDef> {
        Arc::new(self)
    }

    /// Reject definitions that would corrupt multiplier arithmetic.
    pub fn validate(&self) -> Result<()> {
        if self.max_stacks == 0 {
            return Err(SimError::Config(format!(
                "aura '{}' must allow at least one stack",
                self.label
            )));
        }
        for modifier in &self.multipliers {
            if !(modifier.value > 0.0) || !modifier.value.is_finite() {
                return Err(SimError::Config(format!(
                    "aura '{}' has a non-positive multiplier {}",
                    self.label, modifier.value
                )));
            }
        }
        if self.stats_per_stack.iter_nonzero().any(|(_, v)| !v.is_finite()) {
            return Err(SimError::Config(format!(
                "aura '{}' has a non-finite stat bonus",
                self.label
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let def = AuraDef::new(AuraId(1), "Night Blade")
            .with_duration(SimTime::from_secs(10))
            .with_max_stacks(3)
            .with_stat(Stat::ArmorPenetration, 435.0);
        assert!(def.is_stacking());
        assert!(!def.is_permanent());
        assert_eq!(def.stats_per_stack[Stat::ArmorPenetration], 435.0);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_multiplier() {
        let def = AuraDef::new(AuraId(1), "Broken")
            .with_multiplier(MultiplierMod::damage_taken(SchoolMask::ALL, 0.0));
        assert!(def.validate().is_err());
        let def = AuraDef::new(AuraId(2), "No Stacks").with_max_stacks(0);
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_multiplier_scope_and_school() {
        let misery = MultiplierMod::damage_taken(SchoolMask::MAGIC, 1.05);
        assert!(misery.applies(ModScope::DamageTaken, SpellSchool::Shadow));
        assert!(!misery.applies(ModScope::DamageTaken, SpellSchool::Physical));
        assert!(!misery.applies(ModScope::DamageDealt, SpellSchool::Shadow));
    }
}
