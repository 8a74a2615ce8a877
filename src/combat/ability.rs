//! Ability templates
//!
//! An [`AbilityDef`] is immutable and shared across iterations. Its
//! [`AbilityKind`] carries only the data its variant needs; the common
//! lifecycle (validate at setup, compute base damage, react once the outcome
//! is final) goes through [`AbilityBehavior`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aura::definition::AuraDef;
use crate::aura::AuraOwner;
use crate::combat::constants::GCD_DEFAULT;
use crate::combat::outcome::{CritRollCategory, OutcomeRollCategory, ProcMask, SpellFlags};
use crate::core::error::{Result, SimError};
use crate::core::registry::IdRegistry;
use crate::core::rng::RandomSource;
use crate::core::types::{ActionId, ActorIndex, CooldownId, SimTime, SpellSchool, TargetIndex};
use crate::entity::resources::{ResourceCost, ResourceKind};
use crate::entity::weapons::{Hand, Weapon};
use crate::proc::triggers::ProcTarget;
use crate::proc::Reaction;

pub const BASE_DAMAGE_LABEL: &str = "Base Damage Roll";

/// Which targets one cast strikes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelection {
    /// Only the target chosen by the rotation.
    #[default]
    Primary,
    /// Every target in the encounter.
    All,
    /// The first `n` targets.
    First(usize),
}

impl TargetSelection {
    /// Target indices struck, in index order. An out-of-range choice falls
    /// back to the primary target.
    pub fn resolve(self, chosen: TargetIndex, num_targets: usize) -> Vec<TargetIndex> {
        match self {
            TargetSelection::Primary if chosen.0 < num_targets => vec![chosen],
            TargetSelection::Primary => vec![TargetIndex::PRIMARY],
            TargetSelection::All => (0..num_targets).map(TargetIndex).collect(),
            TargetSelection::First(n) => (0..n.min(num_targets)).map(TargetIndex).collect(),
        }
    }
}

/// Damage formula and outcome parameters of one hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageSpec {
    pub min: f64,
    pub max: f64,
    /// Spell power or attack power coefficient.
    pub coefficient: f64,
    pub flat_bonus: f64,
    pub roll: OutcomeRollCategory,
    /// Which crit chance applies once the effect connects; `None` never crits.
    pub crit_roll: CritRollCategory,
    pub crit_multiplier: f64,
    /// Fixed at cast time (talents that scale one ability).
    pub static_multiplier: f64,
    pub flat_threat: f64,
    pub threat_multiplier: f64,
}

impl DamageSpec {
    pub fn magic(min: f64, max: f64, coefficient: f64) -> Self {
        Self {
            min,
            max,
            coefficient,
            flat_bonus: 0.0,
            roll: OutcomeRollCategory::Magic,
            crit_roll: CritRollCategory::Magical,
            crit_multiplier: 1.5,
            static_multiplier: 1.0,
            flat_threat: 0.0,
            threat_multiplier: 1.0,
        }
    }

    pub fn physical(min: f64, max: f64, roll: OutcomeRollCategory) -> Self {
        Self {
            roll,
            crit_roll: CritRollCategory::Physical,
            crit_multiplier: 2.0,
            ..Self::magic(min, max, 0.0)
        }
    }

    /// Always lands and deals nothing; used by buffs and resource abilities.
    pub fn none() -> Self {
        Self {
            roll: OutcomeRollCategory::None,
            crit_roll: CritRollCategory::None,
            ..Self::magic(0.0, 0.0, 0.0)
        }
    }

    pub fn with_roll(mut self, roll: OutcomeRollCategory) -> Self {
        self.roll = roll;
        self
    }

    pub fn with_crit_roll(mut self, crit_roll: CritRollCategory) -> Self {
        self.crit_roll = crit_roll;
        self
    }

    pub fn with_crit_multiplier(mut self, crit_multiplier: f64) -> Self {
        self.crit_multiplier = crit_multiplier;
        self
    }

    pub fn with_static_multiplier(mut self, multiplier: f64) -> Self {
        self.static_multiplier = multiplier;
        self
    }

    pub fn with_flat_bonus(mut self, flat_bonus: f64) -> Self {
        self.flat_bonus = flat_bonus;
        self
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.coefficient = coefficient;
        self
    }

    pub fn with_threat(mut self, flat_threat: f64, threat_multiplier: f64) -> Self {
        self.flat_threat = flat_threat;
        self.threat_multiplier = threat_multiplier;
        self
    }

    /// True if the formula can produce non-zero damage.
    pub fn has_damage(&self) -> bool {
        self.max > 0.0 || self.coefficient > 0.0 || self.flat_bonus > 0.0
    }

    /// Physical rolls (and always-hit physical abilities) scale with attack power.
    pub fn uses_attack_power(&self, school: SpellSchool) -> bool {
        self.roll.is_physical() || (self.roll == OutcomeRollCategory::None && school.is_physical())
    }

    /// `uniform(min, max) + (power + bonus_power) × coefficient + flat`.
    pub fn roll_base(&self, input: &DamageInput, school: SpellSchool, rng: &mut RandomSource) -> f64 {
        let power = if self.uses_attack_power(school) {
            input.attack_power
        } else {
            input.spell_power
        };
        rng.uniform(BASE_DAMAGE_LABEL, self.min, self.max)
            + (power + input.bonus_power) * self.coefficient
            + self.flat_bonus
            + input.bonus_flat_damage
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        let values = [
            self.min,
            self.max,
            self.coefficient,
            self.flat_bonus,
            self.static_multiplier,
            self.flat_threat,
            self.threat_multiplier,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SimError::Config(format!(
                "ability '{}' has a negative or non-finite damage parameter",
                name
            )));
        }
        if self.min > self.max {
            return Err(SimError::Config(format!(
                "ability '{}' damage range [{}, {}] is inverted",
                name, self.min, self.max
            )));
        }
        if !(self.crit_multiplier >= 1.0) || !self.crit_multiplier.is_finite() {
            return Err(SimError::Config(format!(
                "ability '{}' crit multiplier must be at least 1",
                name
            )));
        }
        Ok(())
    }
}

/// Caster values the damage formula reads, resolved by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageInput {
    pub spell_power: f64,
    /// Melee or ranged attack power, whichever the ability uses.
    pub attack_power: f64,
    pub bonus_power: f64,
    pub bonus_flat_damage: f64,
    pub weapon: Option<Weapon>,
    pub bonus_weapon_damage: f64,
}

/// One effect after its outcome was decided, as seen by the ability itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEffect {
    pub action: ActionId,
    pub caster: ActorIndex,
    pub target: TargetIndex,
    pub landed: bool,
}

/// Lifecycle shared by every ability kind.
pub trait AbilityBehavior: fmt::Debug + Send + Sync {
    /// Setup-time validation; errors are configuration errors.
    fn init(&self, name: &str) -> Result<()>;

    /// Outcome and damage parameters of the cast's own hit.
    fn damage_spec(&self) -> &DamageSpec;

    fn proc_mask(&self, school: SpellSchool) -> ProcMask {
        if self.damage_spec().roll == OutcomeRollCategory::Ranged {
            ProcMask::RANGED_SPECIAL
        } else if self.damage_spec().uses_attack_power(school) {
            ProcMask::MELEE_MH_SPECIAL
        } else {
            ProcMask::SPELL
        }
    }

    fn weapon_hand(&self) -> Option<Hand> {
        None
    }

    /// Base damage before any multiplier. `None` means the ability cannot
    /// compute damage in this state, which the pipeline treats as fatal.
    fn base_damage(
        &self,
        input: &DamageInput,
        school: SpellSchool,
        rng: &mut RandomSource,
    ) -> Option<f64>;

    /// Effect-local reactions, queued ahead of every aura listener.
    fn on_resolved(&self, _effect: &ResolvedEffect, _reactions: &mut Vec<Reaction>) {}
}

/// Spell or special attack dealing direct damage.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectDamage {
    pub damage: DamageSpec,
}

impl AbilityBehavior for DirectDamage {
    fn init(&self, name: &str) -> Result<()> {
        self.damage.validate(name)?;
        if !self.damage.has_damage() {
            return Err(SimError::Config(format!(
                "direct damage ability '{}' has no damage source",
                name
            )));
        }
        Ok(())
    }

    fn damage_spec(&self) -> &DamageSpec {
        &self.damage
    }

    fn base_damage(
        &self,
        input: &DamageInput,
        school: SpellSchool,
        rng: &mut RandomSource,
    ) -> Option<f64> {
        Some(self.damage.roll_base(input, school, rng))
    }
}

/// Weapon-based attack: auto-attack swing or weapon special.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponStrike {
    pub hand: Hand,
    /// Bonus range, coefficient and flat damage added to the weapon roll.
    pub damage: DamageSpec,
    pub weapon_multiplier: f64,
    /// Auto-attack swings use the white table and auto proc masks.
    pub auto: bool,
}

impl AbilityBehavior for WeaponStrike {
    fn init(&self, name: &str) -> Result<()> {
        self.damage.validate(name)?;
        if !self.damage.roll.is_physical() {
            return Err(SimError::Config(format!(
                "weapon ability '{}' must roll on a physical table",
                name
            )));
        }
        if !(self.weapon_multiplier >= 0.0) || !self.weapon_multiplier.is_finite() {
            return Err(SimError::Config(format!(
                "weapon ability '{}' has an invalid weapon multiplier",
                name
            )));
        }
        Ok(())
    }

    fn damage_spec(&self) -> &DamageSpec {
        &self.damage
    }

    fn proc_mask(&self, _school: SpellSchool) -> ProcMask {
        if self.auto {
            self.hand.auto_proc_mask()
        } else {
            self.hand.special_proc_mask()
        }
    }

    fn weapon_hand(&self) -> Option<Hand> {
        Some(self.hand)
    }

    fn base_damage(
        &self,
        input: &DamageInput,
        school: SpellSchool,
        rng: &mut RandomSource,
    ) -> Option<f64> {
        let weapon = input.weapon?;
        let swing = weapon.roll_damage(rng, self.hand, input.attack_power, input.bonus_weapon_damage);
        // Weapon damage already contains attack power.
        let extra = DamageInput {
            attack_power: 0.0,
            ..*input
        };
        Some(swing * self.weapon_multiplier + self.damage.roll_base(&extra, school, rng))
    }
}

/// Per-tick parameters of a damage-over-time effect.
#[derive(Debug, Clone)]
pub struct DotSpec {
    pub tick_damage: f64,
    pub tick_coefficient: f64,
    pub ticks: u32,
    pub interval: SimTime,
    /// Roll hit and crit per tick; otherwise every tick lands.
    pub roll_ticks: bool,
    pub crit_multiplier: f64,
    pub static_multiplier: f64,
    /// Target aura marking the DoT as active; rotations key refreshes off it.
    pub marker: Arc<AuraDef>,
}

impl DotSpec {
    pub fn new(
        registry: &IdRegistry,
        label: impl Into<String>,
        ticks: u32,
        interval: SimTime,
    ) -> Self {
        let marker = AuraDef::new(registry.aura_id(), label)
            .with_duration(interval * ticks)
            .debuff()
            .into_shared();
        Self {
            tick_damage: 0.0,
            tick_coefficient: 0.0,
            ticks,
            interval,
            roll_ticks: false,
            crit_multiplier: 1.5,
            static_multiplier: 1.0,
            marker,
        }
    }

    pub fn with_tick_damage(mut self, tick_damage: f64, tick_coefficient: f64) -> Self {
        self.tick_damage = tick_damage;
        self.tick_coefficient = tick_coefficient;
        self
    }

    pub fn rolling_ticks(mut self, crit_multiplier: f64) -> Self {
        self.roll_ticks = true;
        self.crit_multiplier = crit_multiplier;
        self
    }

    pub fn with_static_multiplier(mut self, multiplier: f64) -> Self {
        self.static_multiplier = multiplier;
        self
    }

    pub fn duration(&self) -> SimTime {
        self.interval * self.ticks
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.ticks == 0 || self.interval.is_zero() {
            return Err(SimError::Config(format!(
                "periodic ability '{}' needs at least one tick and a positive interval",
                name
            )));
        }
        let values = [self.tick_damage, self.tick_coefficient, self.static_multiplier];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SimError::Config(format!(
                "periodic ability '{}' has a negative or non-finite tick parameter",
                name
            )));
        }
        if self.tick_damage <= 0.0 && self.tick_coefficient <= 0.0 {
            return Err(SimError::Config(format!(
                "periodic ability '{}' has no tick damage source",
                name
            )));
        }
        if !(self.crit_multiplier >= 1.0) {
            return Err(SimError::Config(format!(
                "periodic ability '{}' crit multiplier must be at least 1",
                name
            )));
        }
        self.marker.validate()
    }
}

/// Damage over time, optionally with an initial hit.
#[derive(Debug, Clone)]
pub struct PeriodicDamage {
    /// Outcome roll of the application plus any initial damage.
    pub hit: DamageSpec,
    pub tick: DotSpec,
}

impl AbilityBehavior for PeriodicDamage {
    fn init(&self, name: &str) -> Result<()> {
        self.hit.validate(name)?;
        self.tick.validate(name)
    }

    fn damage_spec(&self) -> &DamageSpec {
        &self.hit
    }

    fn base_damage(
        &self,
        input: &DamageInput,
        school: SpellSchool,
        rng: &mut RandomSource,
    ) -> Option<f64> {
        if self.hit.has_damage() {
            Some(self.hit.roll_base(input, school, rng))
        } else {
            Some(0.0)
        }
    }

    fn on_resolved(&self, effect: &ResolvedEffect, reactions: &mut Vec<Reaction>) {
        if effect.landed {
            reactions.push(Reaction::ApplyDot {
                caster: effect.caster,
                action: effect.action,
                target: effect.target,
            });
        }
    }
}

/// Applies an aura to the caster or the struck target.
#[derive(Debug, Clone)]
pub struct AuraApplication {
    pub aura: Arc<AuraDef>,
    pub apply_to: ProcTarget,
    pub stacks: Option<u32>,
    /// Outcome roll deciding whether the aura sticks.
    pub check: DamageSpec,
}

impl AbilityBehavior for AuraApplication {
    fn init(&self, name: &str) -> Result<()> {
        self.check.validate(name)?;
        self.aura.validate()
    }

    fn damage_spec(&self) -> &DamageSpec {
        &self.check
    }

    fn base_damage(
        &self,
        _input: &DamageInput,
        _school: SpellSchool,
        _rng: &mut RandomSource,
    ) -> Option<f64> {
        Some(0.0)
    }

    fn on_resolved(&self, effect: &ResolvedEffect, reactions: &mut Vec<Reaction>) {
        if !effect.landed {
            return;
        }
        let owner = match self.apply_to {
            ProcTarget::Caster => AuraOwner::Actor(effect.caster),
            ProcTarget::Target => AuraOwner::Target(effect.target),
        };
        reactions.push(Reaction::ApplyAura {
            owner,
            aura: Arc::clone(&self.aura),
            stacks: self.stacks,
        });
    }
}

/// Restores a resource to the caster (potions, Evocation-like effects).
#[derive(Debug, Clone)]
pub struct ResourceRestore {
    pub kind: ResourceKind,
    pub amount: f64,
    check: DamageSpec,
}

impl ResourceRestore {
    pub fn new(kind: ResourceKind, amount: f64) -> Self {
        Self {
            kind,
            amount,
            check: DamageSpec::none(),
        }
    }
}

impl AbilityBehavior for ResourceRestore {
    fn init(&self, name: &str) -> Result<()> {
        if !(self.amount > 0.0) || !self.amount.is_finite() {
            return Err(SimError::Config(format!(
                "resource ability '{}' must restore a positive amount",
                name
            )));
        }
        Ok(())
    }

    fn damage_spec(&self) -> &DamageSpec {
        &self.check
    }

    fn proc_mask(&self, _school: SpellSchool) -> ProcMask {
        ProcMask::NONE
    }

    fn base_damage(
        &self,
        _input: &DamageInput,
        _school: SpellSchool,
        _rng: &mut RandomSource,
    ) -> Option<f64> {
        Some(0.0)
    }

    fn on_resolved(&self, effect: &ResolvedEffect, reactions: &mut Vec<Reaction>) {
        reactions.push(Reaction::RestoreResource {
            actor: effect.caster,
            kind: self.kind,
            amount: self.amount,
        });
    }
}

#[derive(Debug, Clone)]
pub enum AbilityKind {
    Direct(DirectDamage),
    Weapon(WeaponStrike),
    Periodic(PeriodicDamage),
    Aura(AuraApplication),
    Resource(ResourceRestore),
}

impl AbilityKind {
    pub fn behavior(&self) -> &dyn AbilityBehavior {
        match self {
            AbilityKind::Direct(kind) => kind,
            AbilityKind::Weapon(kind) => kind,
            AbilityKind::Periodic(kind) => kind,
            AbilityKind::Aura(kind) => kind,
            AbilityKind::Resource(kind) => kind,
        }
    }

    pub fn dot(&self) -> Option<&DotSpec> {
        match self {
            AbilityKind::Periodic(periodic) => Some(&periodic.tick),
            _ => None,
        }
    }
}

/// A cooldown timer and how long the ability locks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownSpec {
    pub id: CooldownId,
    pub duration: SimTime,
}

/// Immutable template of one ability.
#[derive(Debug, Clone)]
pub struct AbilityDef {
    pub id: ActionId,
    pub name: String,
    pub school: SpellSchool,
    pub cost: Option<ResourceCost>,
    /// Unhasted cast time; zero for instants.
    pub cast_time: SimTime,
    /// Unhasted global cooldown; `None` for off-GCD abilities.
    pub gcd: Option<SimTime>,
    pub cooldown: Option<CooldownSpec>,
    /// Timer coupled with other abilities (trinkets, shield abilities).
    pub shared_cooldown: Option<CooldownSpec>,
    pub targets: TargetSelection,
    pub flags: SpellFlags,
    pub kind: AbilityKind,
}

impl AbilityDef {
    pub fn new(id: ActionId, name: impl Into<String>, school: SpellSchool, kind: AbilityKind) -> Self {
        Self {
            id,
            name: name.into(),
            school,
            cost: None,
            cast_time: SimTime::ZERO,
            gcd: Some(GCD_DEFAULT),
            cooldown: None,
            shared_cooldown: None,
            targets: TargetSelection::Primary,
            flags: SpellFlags::NONE,
            kind,
        }
    }

    /// Automatic swing of `hand`. Never on the GCD and never chosen by rotations.
    pub fn auto_attack(hand: Hand) -> Self {
        let (name, roll) = match hand {
            Hand::MainHand => ("Auto Attack", OutcomeRollCategory::White),
            Hand::OffHand => ("Off-hand Auto Attack", OutcomeRollCategory::White),
            Hand::Ranged => ("Auto Shot", OutcomeRollCategory::Ranged),
        };
        let strike = WeaponStrike {
            hand,
            damage: DamageSpec::physical(0.0, 0.0, roll),
            weapon_multiplier: 1.0,
            auto: true,
        };
        Self::new(hand.auto_attack_id(), name, SpellSchool::Physical, AbilityKind::Weapon(strike))
            .off_gcd()
    }

    pub fn with_cost(mut self, cost: ResourceCost) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_cast_time(mut self, cast_time: SimTime) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_gcd(mut self, gcd: SimTime) -> Self {
        self.gcd = Some(gcd);
        self
    }

    pub fn off_gcd(mut self) -> Self {
        self.gcd = None;
        self
    }

    /// Own cooldown, allocating a fresh timer from `registry`.
    pub fn with_cooldown(mut self, registry: &IdRegistry, duration: SimTime) -> Self {
        self.cooldown = Some(CooldownSpec {
            id: registry.cooldown_id(),
            duration,
        });
        self
    }

    pub fn with_shared_cooldown(mut self, shared: CooldownSpec) -> Self {
        self.shared_cooldown = Some(shared);
        self
    }

    pub fn with_targets(mut self, targets: TargetSelection) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_flags(mut self, flags: SpellFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn into_shared(self) -> Arc<AbilityDef> {
        Arc::new(self)
    }

    pub fn behavior(&self) -> &dyn AbilityBehavior {
        self.kind.behavior()
    }

    pub fn damage(&self) -> &DamageSpec {
        self.behavior().damage_spec()
    }

    pub fn triggers_gcd(&self) -> bool {
        self.gcd.is_some()
    }

    pub fn is_auto_attack(&self) -> bool {
        matches!(&self.kind, AbilityKind::Weapon(strike) if strike.auto)
    }

    /// Physical abilities use the fixed 1.5 s GCD and melee haste.
    pub fn is_physical(&self) -> bool {
        self.damage().roll.is_physical() || self.school.is_physical()
    }

    pub fn proc_mask(&self) -> ProcMask {
        self.behavior().proc_mask(self.school)
    }

    /// Cooldown timers this ability starts, own timer first.
    pub fn cooldowns(&self) -> impl Iterator<Item = &CooldownSpec> {
        self.cooldown.iter().chain(self.shared_cooldown.iter())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SimError::Config(format!("ability {} has no name", self.id)));
        }
        if let Some(cost) = &self.cost {
            if !(cost.amount >= 0.0) || !cost.amount.is_finite() {
                return Err(SimError::Config(format!(
                    "ability '{}' has an invalid cost",
                    self.name
                )));
            }
        }
        if self.cooldowns().any(|cd| cd.id == CooldownId::GCD) {
            return Err(SimError::Config(format!(
                "ability '{}' uses the reserved GCD timer as a cooldown",
                self.name
            )));
        }
        if let TargetSelection::First(0) = self.targets {
            return Err(SimError::Config(format!(
                "ability '{}' strikes no targets",
                self.name
            )));
        }
        self.behavior().init(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(spell_power: f64) -> DamageInput {
        DamageInput {
            spell_power,
            ..DamageInput::default()
        }
    }

    #[test]
    fn test_target_selection() {
        assert_eq!(TargetSelection::Primary.resolve(TargetIndex(1), 3), vec![TargetIndex(1)]);
        assert_eq!(TargetSelection::Primary.resolve(TargetIndex(5), 3), vec![TargetIndex(0)]);
        assert_eq!(TargetSelection::All.resolve(TargetIndex(0), 3).len(), 3);
        assert_eq!(
            TargetSelection::First(2).resolve(TargetIndex(0), 5),
            vec![TargetIndex(0), TargetIndex(1)]
        );
        assert_eq!(TargetSelection::First(9).resolve(TargetIndex(0), 2).len(), 2);
    }

    #[test]
    fn test_direct_damage_formula() {
        let direct = DirectDamage {
            damage: DamageSpec::magic(100.0, 100.0, 0.8571).with_flat_bonus(10.0),
        };
        let mut rng = RandomSource::new(3);
        let damage = direct
            .base_damage(&input(1000.0), SpellSchool::Shadow, &mut rng)
            .unwrap();
        assert!((damage - (100.0 + 857.1 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_direct_without_damage_rejected() {
        let ability = AbilityDef::new(
            ActionId::spell(1),
            "Nothing",
            SpellSchool::Fire,
            AbilityKind::Direct(DirectDamage {
                damage: DamageSpec::magic(0.0, 0.0, 0.0),
            }),
        );
        assert!(ability.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_weapon_strike_needs_weapon() {
        let strike = WeaponStrike {
            hand: Hand::MainHand,
            damage: DamageSpec::physical(0.0, 0.0, OutcomeRollCategory::Special).with_flat_bonus(50.0),
            weapon_multiplier: 1.0,
            auto: false,
        };
        let mut rng = RandomSource::new(3);
        assert!(strike
            .base_damage(&DamageInput::default(), SpellSchool::Physical, &mut rng)
            .is_none());

        let armed = DamageInput {
            attack_power: 1400.0,
            weapon: Some(Weapon::new(200.0, 200.0, 3.0)),
            ..DamageInput::default()
        };
        let damage = strike.base_damage(&armed, SpellSchool::Physical, &mut rng).unwrap();
        assert!((damage - (200.0 + 300.0 + 50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_periodic_queues_dot_only_when_landed() {
        let registry = IdRegistry::new();
        let periodic = PeriodicDamage {
            hit: DamageSpec::magic(0.0, 0.0, 0.0),
            tick: DotSpec::new(&registry, "Corruption", 6, SimTime::from_secs(3))
                .with_tick_damage(150.0, 0.1563),
        };
        assert!(periodic.init("Corruption").is_ok());
        assert_eq!(periodic.tick.marker.duration, Some(SimTime::from_secs(18)));

        let mut reactions = Vec::new();
        let mut effect = ResolvedEffect {
            action: ActionId::spell(27216),
            caster: ActorIndex(0),
            target: TargetIndex::PRIMARY,
            landed: false,
        };
        periodic.on_resolved(&effect, &mut reactions);
        assert!(reactions.is_empty());
        effect.landed = true;
        periodic.on_resolved(&effect, &mut reactions);
        assert!(matches!(reactions[0], Reaction::ApplyDot { .. }));
    }

    #[test]
    fn test_auto_attack_template() {
        let swing = AbilityDef::auto_attack(Hand::OffHand);
        assert!(!swing.triggers_gcd());
        assert!(swing.is_auto_attack());
        assert_eq!(swing.proc_mask(), ProcMask::MELEE_OH_AUTO);
        assert!(swing.validate().is_ok());
    }

    #[test]
    fn test_shared_cooldown_iteration_order() {
        let registry = IdRegistry::new();
        let shared = CooldownSpec {
            id: registry.cooldown_id(),
            duration: SimTime::from_secs(6),
        };
        let ability = AbilityDef::new(
            ActionId::spell(30356),
            "Shield Slam",
            SpellSchool::Physical,
            AbilityKind::Direct(DirectDamage {
                damage: DamageSpec::physical(420.0, 440.0, OutcomeRollCategory::Special),
            }),
        )
        .with_cooldown(&registry, SimTime::from_secs(6))
        .with_shared_cooldown(shared);
        let ids: Vec<_> = ability.cooldowns().map(|cd| cd.id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], shared.id);
        assert_ne!(ids[0], CooldownId::GCD);
    }
}
