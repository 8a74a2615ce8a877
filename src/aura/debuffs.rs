//! Raid debuffs configured on the encounter
//!
//! Each flag becomes a permanent aura on every target at iteration setup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aura::definition::{AuraDef, MultiplierMod};
use crate::aura::modifiers::{SchoolCritBonus, SchoolDamageBonus, SchoolHitBonus};
use crate::combat::outcome::ProcMask;
use crate::core::error::{Result, SimError};
use crate::core::registry::IdRegistry;
use crate::core::stats::Stat;
use crate::core::types::{SchoolMask, SpellSchool, Tristate};
use crate::entity::resources::ResourceKind;
use crate::proc::triggers::{ProcChance, ProcTrigger, ResourceOnHit};

const MAX_DEBUFF_STACKS: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDebuffs {
    pub misery: bool,
    pub curse_of_elements: Tristate,
    pub shadow_weaving: bool,
    pub improved_scorch: bool,
    pub winters_chill: bool,
    /// Fraction of the fight Improved Shadow Bolt is up, in `[0, 1]`.
    pub isb_uptime: f64,
    pub blood_frenzy: bool,
    pub faerie_fire: Tristate,
    pub sunder_armor: bool,
    /// Replaces Sunder Armor when present.
    pub expose_armor: Tristate,
    pub curse_of_recklessness: bool,
    pub judgement_of_wisdom: bool,
}

impl TargetDebuffs {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.isb_uptime) {
            return Err(SimError::Config(format!(
                "isb_uptime ({}) must be within [0, 1]",
                self.isb_uptime
            )));
        }
        Ok(())
    }

    /// Build the permanent target auras with their initial stack counts.
    pub fn auras(&self, registry: &IdRegistry) -> Result<Vec<(Arc<AuraDef>, u32)>> {
        self.validate()?;
        let mut auras = Vec::new();
        let mut push = |def: AuraDef, stacks: u32| auras.push((def.debuff().into_shared(), stacks));

        if self.misery {
            push(
                AuraDef::new(registry.aura_id(), "Misery")
                    .with_multiplier(MultiplierMod::damage_taken(SchoolMask::MAGIC, 1.05)),
                1,
            );
        }

        let elements = match self.curse_of_elements {
            Tristate::Missing => None,
            Tristate::Regular => Some(1.10),
            Tristate::Improved => Some(1.13),
        };
        if let Some(value) = elements {
            let schools = SchoolMask::MAGIC
                .without(SpellSchool::Nature)
                .without(SpellSchool::Holy);
            push(
                AuraDef::new(registry.aura_id(), "Curse of Elements")
                    .with_multiplier(MultiplierMod::damage_taken(schools, value)),
                1,
            );
        }

        if self.shadow_weaving {
            push(
                AuraDef::new(registry.aura_id(), "Shadow Weaving")
                    .with_max_stacks(MAX_DEBUFF_STACKS)
                    .with_hooks(SchoolDamageBonus {
                        schools: SchoolMask::of(SpellSchool::Shadow),
                        per_stack: 0.02,
                    }),
                MAX_DEBUFF_STACKS,
            );
        }

        if self.improved_scorch {
            push(
                AuraDef::new(registry.aura_id(), "Improved Scorch")
                    .with_max_stacks(MAX_DEBUFF_STACKS)
                    .with_hooks(SchoolDamageBonus {
                        schools: SchoolMask::of(SpellSchool::Fire),
                        per_stack: 0.03,
                    }),
                MAX_DEBUFF_STACKS,
            );
        }

        if self.winters_chill {
            push(
                AuraDef::new(registry.aura_id(), "Winter's Chill")
                    .with_max_stacks(MAX_DEBUFF_STACKS)
                    .with_hooks(SchoolCritBonus {
                        schools: SchoolMask::of(SpellSchool::Frost),
                        chance_per_stack: 0.02,
                    }),
                MAX_DEBUFF_STACKS,
            );
        }

        if self.isb_uptime > 0.0 {
            push(
                AuraDef::new(registry.aura_id(), "Improved Shadow Bolt").with_multiplier(
                    MultiplierMod::damage_taken(
                        SchoolMask::of(SpellSchool::Shadow),
                        1.0 + 0.2 * self.isb_uptime,
                    ),
                ),
                1,
            );
        }

        if self.blood_frenzy {
            push(
                AuraDef::new(registry.aura_id(), "Blood Frenzy").with_multiplier(
                    MultiplierMod::damage_taken(SchoolMask::of(SpellSchool::Physical), 1.04),
                ),
                1,
            );
        }

        if self.faerie_fire.is_present() {
            let mut def =
                AuraDef::new(registry.aura_id(), "Faerie Fire").with_stat(Stat::Armor, -610.0);
            if self.faerie_fire == Tristate::Improved {
                def = def.with_hooks(SchoolHitBonus {
                    schools: SchoolMask::of(SpellSchool::Physical),
                    chance: 0.03,
                });
            }
            push(def, 1);
        }

        match self.expose_armor {
            Tristate::Regular => push(
                AuraDef::new(registry.aura_id(), "Expose Armor").with_stat(Stat::Armor, -2050.0),
                1,
            ),
            Tristate::Improved => push(
                AuraDef::new(registry.aura_id(), "Expose Armor").with_stat(Stat::Armor, -3075.0),
                1,
            ),
            Tristate::Missing if self.sunder_armor => push(
                AuraDef::new(registry.aura_id(), "Sunder Armor")
                    .with_max_stacks(MAX_DEBUFF_STACKS)
                    .with_stat(Stat::Armor, -520.0),
                MAX_DEBUFF_STACKS,
            ),
            Tristate::Missing => {}
        }

        if self.curse_of_recklessness {
            push(
                AuraDef::new(registry.aura_id(), "Curse of Recklessness")
                    .with_stat(Stat::Armor, -800.0),
                1,
            );
        }

        if self.judgement_of_wisdom {
            push(
                AuraDef::new(registry.aura_id(), "Judgement of Wisdom").with_hooks(ResourceOnHit {
                    trigger: ProcTrigger::new(
                        "Judgement of Wisdom",
                        ProcChance::Fixed(0.5),
                        ProcMask::WEAPON | ProcMask::SPELL,
                    ),
                    kind: ResourceKind::Mana,
                    amount: 74.0,
                }),
                1,
            );
        }

        Ok(auras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_debuffs_no_auras() {
        let registry = IdRegistry::new();
        assert!(TargetDebuffs::default().auras(&registry).unwrap().is_empty());
        assert_eq!(registry.aura_count(), 0);
    }

    #[test]
    fn test_expose_replaces_sunder() {
        let registry = IdRegistry::new();
        let debuffs = TargetDebuffs {
            sunder_armor: true,
            expose_armor: Tristate::Improved,
            ..TargetDebuffs::default()
        };
        let auras = debuffs.auras(&registry).unwrap();
        assert_eq!(auras.len(), 1);
        assert_eq!(auras[0].0.label, "Expose Armor");
        assert_eq!(auras[0].0.stats_per_stack[Stat::Armor], -3075.0);
    }

    #[test]
    fn test_sunder_stacks_to_full() {
        let registry = IdRegistry::new();
        let debuffs = TargetDebuffs {
            sunder_armor: true,
            ..TargetDebuffs::default()
        };
        let auras = debuffs.auras(&registry).unwrap();
        let (def, stacks) = &auras[0];
        assert_eq!(*stacks, 5);
        assert_eq!(def.stats_per_stack[Stat::Armor] * *stacks as f64, -2600.0);
        assert!(def.is_debuff);
    }

    #[test]
    fn test_isb_uptime_validated() {
        let debuffs = TargetDebuffs {
            isb_uptime: 1.5,
            ..TargetDebuffs::default()
        };
        assert!(debuffs.auras(&IdRegistry::new()).unwrap_err().is_config());
    }

    #[test]
    fn test_ids_are_distinct() {
        let registry = IdRegistry::new();
        let debuffs = TargetDebuffs {
            misery: true,
            curse_of_elements: Tristate::Regular,
            blood_frenzy: true,
            ..TargetDebuffs::default()
        };
        let auras = debuffs.auras(&registry).unwrap();
        let mut ids: Vec<_> = auras.iter().map(|(def, _)| def.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }
}
