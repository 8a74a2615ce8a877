//! Player characters (and pets) taking part in an iteration

use std::sync::Arc;

use ahash::AHashMap;

use crate::aura::definition::ModScope;
use crate::aura::hooks::CastTiming;
use crate::aura::set::AuraSet;
use crate::combat::ability::AbilityDef;
use crate::combat::cast::RejectReason;
use crate::combat::constants::{GCD_DEFAULT, HASTE_RATING_PER_HASTE_PERCENT};
use crate::core::stats::{Stat, StatBlock};
use crate::core::types::{ActionId, ActorIndex, CooldownId, SimTime, SpellSchool, TargetIndex};
use crate::entity::config::CharacterConfig;
use crate::entity::cooldowns::Cooldowns;
use crate::entity::pseudo::PseudoStats;
use crate::entity::resources::{self, ResourceKind, Resources};
use crate::entity::weapons::{Hand, Weapons};
use crate::rotation::Rotation;

/// Swing timer of one hand.
#[derive(Debug, Clone)]
pub struct AutoAttack {
    pub ability: Arc<AbilityDef>,
    pub hand: Hand,
    pub next_swing: SimTime,
}

/// A cast with a cast time that has started but not finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCast {
    pub action: ActionId,
    pub target: TargetIndex,
    pub started_at: SimTime,
    pub completes_at: SimTime,
}

#[derive(Debug, Clone)]
pub struct Character {
    pub index: ActorIndex,
    pub name: String,
    pub stats: StatBlock,
    pub pseudo: PseudoStats,
    pub auras: AuraSet,
    pub resources: Resources,
    pub cooldowns: Cooldowns,
    pub weapons: Weapons,
    pub auto_attacks: Vec<AutoAttack>,
    pub rotation: Arc<dyn Rotation>,
    pub casting: Option<PendingCast>,
    /// Next time the rotation asks to be consulted; `None` means at the next event.
    pub wake_at: Option<SimTime>,
    pub damage_done: f64,
    pub oom_at: Option<SimTime>,
    pub damage_at_oom: f64,
    /// Currently blocked on mana.
    pub out_of_mana: bool,
    abilities: Vec<Arc<AbilityDef>>,
    ability_index: AHashMap<ActionId, usize>,
}

impl Character {
    /// Fresh per-iteration state. Expects a validated config.
    pub fn from_config(index: ActorIndex, config: &CharacterConfig) -> Self {
        let stats = StatBlock::new(config.base_stats, config.dependencies.clone());
        let resources = Resources::new(&config.resources, stats.get(Stat::Mana));

        let mut abilities: Vec<Arc<AbilityDef>> = config.abilities.clone();
        let mut auto_attacks = Vec::new();
        for hand in config.weapons.swinging_hands() {
            let ability = AbilityDef::auto_attack(hand).into_shared();
            abilities.push(Arc::clone(&ability));
            auto_attacks.push(AutoAttack {
                ability,
                hand,
                next_swing: SimTime::ZERO,
            });
        }
        let ability_index = abilities
            .iter()
            .enumerate()
            .map(|(i, def)| (def.id, i))
            .collect();

        Self {
            index,
            name: config.name.clone(),
            stats,
            pseudo: config.pseudo.clone(),
            auras: AuraSet::new(),
            resources,
            cooldowns: Cooldowns::new(),
            weapons: config.weapons.clone(),
            auto_attacks,
            rotation: Arc::clone(&config.rotation),
            casting: None,
            wake_at: Some(SimTime::ZERO),
            damage_done: 0.0,
            oom_at: None,
            damage_at_oom: 0.0,
            out_of_mana: false,
            abilities,
            ability_index,
        }
    }

    pub fn ability(&self, id: ActionId) -> Option<&Arc<AbilityDef>> {
        self.ability_index.get(&id).map(|&i| &self.abilities[i])
    }

    pub fn abilities(&self) -> &[Arc<AbilityDef>] {
        &self.abilities
    }

    /// Generic plus school-specific spell power.
    pub fn spell_power(&self, school: SpellSchool) -> f64 {
        let school_power = Stat::school_power(school).map_or(0.0, |stat| self.stats.get(stat));
        self.stats.get(Stat::SpellPower) + school_power
    }

    pub fn attack_power(&self, ranged: bool) -> f64 {
        if ranged {
            self.stats.get(Stat::RangedAttackPower)
        } else {
            self.stats.get(Stat::AttackPower)
        }
    }

    /// Cast speed factor; divides cast times and spell GCDs.
    pub fn cast_speed(&self, school: SpellSchool) -> f64 {
        let haste = 1.0 + self.stats.get(Stat::SpellHaste) / (HASTE_RATING_PER_HASTE_PERCENT * 100.0);
        haste * self.pseudo.cast_speed_multiplier * self.auras.multiplier(ModScope::CastSpeed, school)
    }

    /// Attack speed factor; divides weapon speeds.
    pub fn attack_speed(&self) -> f64 {
        let haste = 1.0 + self.stats.get(Stat::MeleeHaste) / (HASTE_RATING_PER_HASTE_PERCENT * 100.0);
        haste
            * self.pseudo.attack_speed_multiplier
            * self.auras.multiplier(ModScope::AttackSpeed, SpellSchool::Physical)
    }

    pub fn swing_interval(&self, hand: Hand) -> Option<SimTime> {
        let weapon = self.weapons.get(hand)?;
        Some(weapon.speed().div_f64(self.attack_speed().max(f64::EPSILON)))
    }

    pub fn damage_dealt_multiplier(&self, school: SpellSchool, ranged: bool) -> f64 {
        self.pseudo.damage_dealt(school, ranged) * self.auras.multiplier(ModScope::DamageDealt, school)
    }

    pub fn threat_multiplier(&self, school: SpellSchool) -> f64 {
        self.pseudo.threat_multiplier * self.auras.multiplier(ModScope::Threat, school)
    }

    pub fn mana_regen_per_second(&self) -> f64 {
        resources::mana_regen_per_second(self.stats.current(), self.pseudo.spirit_regen_while_casting)
    }

    /// Hasted cast time and GCD before cast-start hooks run.
    ///
    /// Physical abilities keep their GCD; spell GCDs shrink with haste down
    /// to `gcd_min`.
    pub fn cast_timing(&self, def: &AbilityDef, gcd_min: SimTime) -> CastTiming {
        let (cast_time, gcd) = if def.is_physical() {
            let speed = self.attack_speed().max(f64::EPSILON);
            (def.cast_time.div_f64(speed), def.gcd.unwrap_or(SimTime::ZERO))
        } else {
            let speed = self.cast_speed(def.school).max(f64::EPSILON);
            let gcd = def
                .gcd
                .map_or(SimTime::ZERO, |gcd| gcd.div_f64(speed).max(gcd_min.min(GCD_DEFAULT)));
            (def.cast_time.div_f64(speed), gcd)
        };
        CastTiming {
            action: def.id,
            school: def.school,
            cast_time,
            gcd,
        }
    }

    /// `None` if `def` may start now.
    pub fn check_cast(&self, def: &AbilityDef, now: SimTime) -> Option<RejectReason> {
        if self.casting.is_some() {
            return Some(RejectReason::Casting);
        }
        if def.triggers_gcd() && !self.cooldowns.is_ready(CooldownId::GCD, now) {
            return Some(RejectReason::OnGlobalCooldown);
        }
        if let Some(cd) = def.cooldowns().find(|cd| !self.cooldowns.is_ready(cd.id, now)) {
            return Some(RejectReason::OnCooldown(cd.id));
        }
        match &def.cost {
            Some(cost) if !self.resources.can_afford(cost) => {
                Some(RejectReason::InsufficientResource(cost.kind))
            }
            _ => None,
        }
    }

    /// Earliest time `def` could start, assuming nothing else is cast.
    /// `None` if regeneration alone never makes it affordable.
    pub fn ready_at(&self, def: &AbilityDef, now: SimTime) -> Option<SimTime> {
        let mut ready = now;
        if let Some(pending) = &self.casting {
            ready = ready.max(pending.completes_at);
        }
        if def.triggers_gcd() {
            ready = ready.max(self.cooldowns.ready_at(CooldownId::GCD));
        }
        for cd in def.cooldowns() {
            ready = ready.max(self.cooldowns.ready_at(cd.id));
        }
        if let Some(cost) = &def.cost {
            let wait = self.resources.time_to_afford(cost, self.mana_regen_per_second())?;
            ready = ready.max(now.saturating_add(wait));
        }
        Some(ready)
    }

    /// Mark the actor out of mana; the first occurrence is kept for metrics.
    pub fn mark_out_of_mana(&mut self, now: SimTime) {
        if !self.resources.has(ResourceKind::Mana) {
            return;
        }
        if self.oom_at.is_none() {
            self.oom_at = Some(now);
            self.damage_at_oom = self.damage_done;
            tracing::debug!(actor = %self.name, ?now, "out of mana");
        }
        self.out_of_mana = true;
    }

    pub fn next_swing(&self) -> Option<SimTime> {
        self.auto_attacks.iter().map(|a| a.next_swing).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::ability::{AbilityKind, DamageSpec, DirectDamage};
    use crate::core::registry::IdRegistry;
    use crate::core::stats::Stats;
    use crate::entity::resources::{ResourceConfig, ResourceCost};
    use crate::entity::weapons::{AutoAttackMode, Weapon};
    use crate::rotation::NoRotation;

    fn bolt(registry: &IdRegistry) -> AbilityDef {
        AbilityDef::new(
            ActionId::spell(27209),
            "Shadow Bolt",
            SpellSchool::Shadow,
            AbilityKind::Direct(DirectDamage {
                damage: DamageSpec::magic(544.0, 607.0, 0.8571),
            }),
        )
        .with_cost(ResourceCost::mana(420.0))
        .with_cast_time(SimTime::from_millis(2500))
        .with_cooldown(registry, SimTime::from_secs(6))
    }

    fn character(registry: &IdRegistry) -> Character {
        let config = CharacterConfig::new("Warlock", NoRotation)
            .with_stats(
                Stats::new()
                    .with(Stat::SpellPower, 1000.0)
                    .with(Stat::ShadowSpellPower, 200.0)
                    .with(Stat::Mana, 1000.0)
                    .with(Stat::SpellHaste, 157.7),
            )
            .with_resources(ResourceConfig {
                mana: true,
                ..ResourceConfig::default()
            })
            .with_ability(bolt(registry));
        Character::from_config(ActorIndex(0), &config)
    }

    #[test]
    fn test_spell_power_includes_school() {
        let registry = IdRegistry::new();
        let c = character(&registry);
        assert_eq!(c.spell_power(SpellSchool::Shadow), 1200.0);
        assert_eq!(c.spell_power(SpellSchool::Fire), 1000.0);
    }

    #[test]
    fn test_haste_shortens_cast_and_gcd() {
        let registry = IdRegistry::new();
        let c = character(&registry);
        let def = c.ability(ActionId::spell(27209)).unwrap().clone();
        let timing = c.cast_timing(&def, SimTime::from_secs(1));
        // 10% haste
        assert!((timing.cast_time.as_secs_f64() - 2.5 / 1.1).abs() < 1e-6);
        assert!((timing.gcd.as_secs_f64() - 1.5 / 1.1).abs() < 1e-6);

        let floored = c.cast_timing(&def, SimTime::from_millis(1450));
        assert_eq!(floored.gcd, SimTime::from_millis(1450));
    }

    #[test]
    fn test_check_cast_order() {
        let registry = IdRegistry::new();
        let mut c = character(&registry);
        let def = c.ability(ActionId::spell(27209)).unwrap().clone();
        assert_eq!(c.check_cast(&def, SimTime::ZERO), None);

        c.cooldowns.start(CooldownId::GCD, SimTime::ZERO, GCD_DEFAULT);
        assert_eq!(c.check_cast(&def, SimTime::ZERO), Some(RejectReason::OnGlobalCooldown));

        let cd = def.cooldown.unwrap();
        c.cooldowns.start(cd.id, SimTime::ZERO, cd.duration);
        assert_eq!(
            c.check_cast(&def, SimTime::from_secs(2)),
            Some(RejectReason::OnCooldown(cd.id))
        );
        assert_eq!(c.ready_at(&def, SimTime::from_secs(2)), Some(SimTime::from_secs(6)));

        c.resources.spend(&ResourceCost::mana(900.0));
        assert_eq!(
            c.check_cast(&def, SimTime::from_secs(6)),
            Some(RejectReason::InsufficientResource(ResourceKind::Mana))
        );
    }

    #[test]
    fn test_auto_attacks_registered_as_abilities() {
        let config = CharacterConfig::new("Rogue", NoRotation).with_weapons(Weapons {
            main_hand: Some(Weapon::new(150.0, 280.0, 2.6)),
            off_hand: Some(Weapon::new(100.0, 190.0, 1.4)),
            ranged: None,
            auto_attack: AutoAttackMode::Melee,
        });
        let c = Character::from_config(ActorIndex(0), &config);
        assert_eq!(c.auto_attacks.len(), 2);
        assert!(c.ability(Hand::OffHand.auto_attack_id()).is_some());
        assert_eq!(c.swing_interval(Hand::OffHand), Some(SimTime::from_millis(1400)));
    }

    #[test]
    fn test_oom_recorded_once() {
        let registry = IdRegistry::new();
        let mut c = character(&registry);
        c.damage_done = 5000.0;
        c.mark_out_of_mana(SimTime::from_secs(40));
        c.damage_done = 9000.0;
        c.mark_out_of_mana(SimTime::from_secs(80));
        assert_eq!(c.oom_at, Some(SimTime::from_secs(40)));
        assert_eq!(c.damage_at_oom, 5000.0);
    }
}
