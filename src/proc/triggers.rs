//! Chance-on-hit listeners: aura application, phantom spells, resource returns

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aura::definition::AuraDef;
use crate::aura::hooks::AuraHooks;
use crate::aura::set::AuraState;
use crate::aura::AuraOwner;
use crate::combat::effect::HitEvent;
use crate::combat::outcome::{HitOutcome, ProcMask};
use crate::core::types::ActionId;
use crate::entity::resources::ResourceKind;
use crate::proc::{ProcContext, Reaction};

/// How likely a trigger is to fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcChance {
    Fixed(f64),
    /// Procs per minute: `ppm × weapon_speed / 60`. Hits without a weapon
    /// speed cannot proc.
    PerMinute(f64),
}

impl ProcChance {
    pub fn chance(&self, weapon_speed: Option<f64>) -> f64 {
        match *self {
            ProcChance::Fixed(chance) => chance,
            ProcChance::PerMinute(ppm) => weapon_speed.map_or(0.0, |speed| ppm * speed / 60.0),
        }
    }
}

/// Filter plus chance shared by every chance-on-hit listener.
#[derive(Debug, Clone)]
pub struct ProcTrigger {
    /// RNG stream label.
    pub label: String,
    pub chance: ProcChance,
    pub mask: ProcMask,
    pub outcomes: HitOutcome,
    pub include_phantom: bool,
}

impl ProcTrigger {
    pub fn new(label: impl Into<String>, chance: ProcChance, mask: ProcMask) -> Self {
        Self {
            label: label.into(),
            chance,
            mask,
            outcomes: HitOutcome::LANDED,
            include_phantom: false,
        }
    }

    pub fn on_outcomes(mut self, outcomes: HitOutcome) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn including_phantom(mut self) -> Self {
        self.include_phantom = true;
        self
    }

    pub fn matches(&self, event: &HitEvent) -> bool {
        event.hit.proc_mask.matches(self.mask)
            && event.outcome.matches(self.outcomes)
            && (self.include_phantom || !event.hit.phantom)
    }

    /// Filter, then roll.
    pub fn fires(&self, event: &HitEvent, ctx: &mut ProcContext<'_>) -> bool {
        self.matches(event) && ctx.roll(&self.label, self.chance.chance(event.hit.weapon_speed))
    }
}

/// Who receives an aura applied by a proc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcTarget {
    Caster,
    Target,
}

fn owner_for(target: ProcTarget, event: &HitEvent) -> AuraOwner {
    match target {
        ProcTarget::Caster => AuraOwner::Actor(event.hit.caster),
        ProcTarget::Target => AuraOwner::Target(event.hit.target),
    }
}

/// Applies (or stacks) an aura when the trigger fires.
#[derive(Debug, Clone)]
pub struct ChanceOnHitAura {
    pub trigger: ProcTrigger,
    pub aura: Arc<AuraDef>,
    pub apply_to: ProcTarget,
}

impl ChanceOnHitAura {
    fn handle(&self, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        if self.trigger.fires(event, ctx) {
            ctx.push(Reaction::ApplyAura {
                owner: owner_for(self.apply_to, event),
                aura: Arc::clone(&self.aura),
                stacks: None,
            });
        }
    }
}

impl AuraHooks for ChanceOnHitAura {
    fn on_hit(&self, _aura: &AuraState, _owner: AuraOwner, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        self.handle(event, ctx);
    }

    fn on_periodic(&self, _aura: &AuraState, _owner: AuraOwner, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        self.handle(event, ctx);
    }
}

/// Casts a phantom spell at the struck target when the trigger fires.
#[derive(Debug, Clone)]
pub struct ChanceOnHitSpell {
    pub trigger: ProcTrigger,
    pub action: ActionId,
}

impl ChanceOnHitSpell {
    fn handle(&self, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        if self.trigger.fires(event, ctx) {
            ctx.push(Reaction::CastSpell {
                caster: event.hit.caster,
                action: self.action,
                target: event.hit.target,
            });
        }
    }
}

impl AuraHooks for ChanceOnHitSpell {
    fn on_hit(&self, _aura: &AuraState, _owner: AuraOwner, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        self.handle(event, ctx);
    }

    fn on_periodic(&self, _aura: &AuraState, _owner: AuraOwner, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        self.handle(event, ctx);
    }
}

/// Returns a resource to whoever struck the owner (Judgement of Wisdom).
#[derive(Debug, Clone)]
pub struct ResourceOnHit {
    pub trigger: ProcTrigger,
    pub kind: ResourceKind,
    pub amount: f64,
}

impl AuraHooks for ResourceOnHit {
    fn on_hit(&self, _aura: &AuraState, _owner: AuraOwner, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        if self.trigger.fires(event, ctx) {
            ctx.push(Reaction::RestoreResource {
                actor: event.hit.caster,
                kind: self.kind,
                amount: self.amount,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::effect::HitContext;
    use crate::combat::outcome::OutcomeRollCategory;
    use crate::core::rng::RandomSource;
    use crate::core::types::{ActorIndex, AuraId, SimTime, SpellSchool, TargetIndex};

    fn event(mask: ProcMask, outcome: HitOutcome, phantom: bool) -> HitEvent {
        HitEvent {
            hit: HitContext {
                action: ActionId::spell(1),
                caster: ActorIndex(0),
                target: TargetIndex(1),
                school: SpellSchool::Physical,
                roll: OutcomeRollCategory::White,
                proc_mask: mask,
                periodic: false,
                phantom,
                weapon_speed: Some(3.0),
                now: SimTime::ZERO,
            },
            outcome,
            damage: 100.0,
            threat: 100.0,
        }
    }

    fn state() -> AuraState {
        AuraState {
            id: AuraId(7),
            stacks: 1,
            applied_at: SimTime::ZERO,
            expires_at: crate::core::types::NEVER,
        }
    }

    #[test]
    fn test_ppm_chance_uses_weapon_speed() {
        let ppm = ProcChance::PerMinute(1.0);
        assert!((ppm.chance(Some(3.0)) - 0.05).abs() < 1e-12);
        assert_eq!(ppm.chance(None), 0.0);
        assert_eq!(ProcChance::Fixed(0.3).chance(None), 0.3);
    }

    #[test]
    fn test_trigger_filters() {
        let trigger = ProcTrigger::new("Test Proc", ProcChance::Fixed(1.0), ProcMask::MELEE);
        assert!(trigger.matches(&event(ProcMask::MELEE_MH_AUTO, HitOutcome::HIT, false)));
        assert!(!trigger.matches(&event(ProcMask::SPELL, HitOutcome::HIT, false)));
        assert!(!trigger.matches(&event(ProcMask::MELEE_MH_AUTO, HitOutcome::MISS, false)));
        assert!(!trigger.matches(&event(ProcMask::MELEE_MH_AUTO, HitOutcome::HIT, true)));
        assert!(trigger
            .including_phantom()
            .matches(&event(ProcMask::MELEE_MH_AUTO, HitOutcome::HIT, true)));
    }

    #[test]
    fn test_aura_proc_targets_correct_owner() {
        let proc_aura = ChanceOnHitAura {
            trigger: ProcTrigger::new("Crusader", ProcChance::Fixed(1.0), ProcMask::MELEE),
            aura: AuraDef::new(AuraId(8), "Holy Strength").into_shared(),
            apply_to: ProcTarget::Caster,
        };
        let mut rng = RandomSource::new(1);
        let mut ctx = ProcContext::new(&mut rng, SimTime::ZERO);
        proc_aura.on_hit(
            &state(),
            AuraOwner::Actor(ActorIndex(0)),
            &event(ProcMask::MELEE_MH_AUTO, HitOutcome::CRIT, false),
            &mut ctx,
        );
        match &ctx.reactions()[0] {
            Reaction::ApplyAura { owner, aura, .. } => {
                assert_eq!(*owner, AuraOwner::Actor(ActorIndex(0)));
                assert_eq!(aura.id, AuraId(8));
            }
            other => panic!("unexpected reaction {:?}", other),
        }
    }

    #[test]
    fn test_resource_on_hit_pays_attacker() {
        let wisdom = ResourceOnHit {
            trigger: ProcTrigger::new("Judgement of Wisdom", ProcChance::Fixed(1.0), ProcMask::WEAPON)
                .including_phantom(),
            kind: ResourceKind::Mana,
            amount: 74.0,
        };
        let mut rng = RandomSource::new(1);
        let mut ctx = ProcContext::new(&mut rng, SimTime::ZERO);
        wisdom.on_hit(
            &state(),
            AuraOwner::Target(TargetIndex(1)),
            &event(ProcMask::MELEE_OH_AUTO, HitOutcome::GLANCE, false),
            &mut ctx,
        );
        assert!(matches!(
            ctx.reactions()[0],
            Reaction::RestoreResource { actor: ActorIndex(0), kind: ResourceKind::Mana, .. }
        ));
    }
}
