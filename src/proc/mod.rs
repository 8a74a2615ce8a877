//! Proc and reaction dispatch
//!
//! After an effect's outcome is final the simulation fans out, in order, to
//! the effect-local callback, the caster's active auras and then the
//! target's active auras. Listeners never mutate the world directly; they
//! queue [`Reaction`]s which the simulation applies once the fan-out is done.
//! A reaction may start a nested (phantom) cast, bounded by
//! [`MAX_PROC_DEPTH`](crate::combat::constants::MAX_PROC_DEPTH).

pub mod triggers;

use std::sync::Arc;

use crate::aura::definition::AuraDef;
use crate::aura::hooks::ActiveHook;
use crate::aura::AuraOwner;
use crate::combat::effect::HitEvent;
use crate::core::rng::RandomSource;
use crate::core::types::{ActionId, ActorIndex, AuraId, SimTime, TargetIndex};
use crate::entity::resources::ResourceKind;

pub use triggers::{
    ChanceOnHitAura, ChanceOnHitSpell, ProcChance, ProcTarget, ProcTrigger, ResourceOnHit,
};

/// A deferred change requested by a hook.
#[derive(Debug, Clone)]
pub enum Reaction {
    ApplyAura {
        owner: AuraOwner,
        aura: Arc<AuraDef>,
        stacks: Option<u32>,
    },
    RemoveAura {
        owner: AuraOwner,
        aura: AuraId,
    },
    /// Phantom cast: skips resource and cooldown checks.
    CastSpell {
        caster: ActorIndex,
        action: ActionId,
        target: TargetIndex,
    },
    ApplyDot {
        caster: ActorIndex,
        action: ActionId,
        target: TargetIndex,
    },
    RestoreResource {
        actor: ActorIndex,
        kind: ResourceKind,
        amount: f64,
    },
}

/// Randomness and the reaction queue lent to hooks.
pub struct ProcContext<'a> {
    rng: &'a mut RandomSource,
    pub now: SimTime,
    reactions: Vec<Reaction>,
}

impl<'a> ProcContext<'a> {
    pub fn new(rng: &'a mut RandomSource, now: SimTime) -> Self {
        Self {
            rng,
            now,
            reactions: Vec::new(),
        }
    }

    /// True with probability `chance` on the stream `label`.
    pub fn roll(&mut self, label: &str, chance: f64) -> bool {
        if chance <= 0.0 {
            false
        } else if chance >= 1.0 {
            true
        } else {
            self.rng.random_float(label) < chance
        }
    }

    pub fn rng(&mut self) -> &mut RandomSource {
        &mut *self.rng
    }

    pub fn push(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn into_reactions(self) -> Vec<Reaction> {
        self.reactions
    }
}

/// Fan a finished effect out to listeners in order: effect-local reactions
/// first, then caster auras, then target auras.
pub fn dispatch(
    event: &HitEvent,
    local: Vec<Reaction>,
    caster_hooks: &[ActiveHook],
    target_hooks: &[ActiveHook],
    ctx: &mut ProcContext<'_>,
) {
    for reaction in local {
        ctx.push(reaction);
    }
    for hook in caster_hooks.iter().chain(target_hooks) {
        hook.after_hit(event, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certain_rolls_do_not_draw() {
        let mut rng = RandomSource::new(5);
        let mut ctx = ProcContext::new(&mut rng, SimTime::ZERO);
        assert!(ctx.roll("Proc", 1.0));
        assert!(!ctx.roll("Proc", 0.0));
        assert_eq!(ctx.rng().draws(), 0);
    }

    #[test]
    fn test_reactions_collected_in_order() {
        let mut rng = RandomSource::new(5);
        let mut ctx = ProcContext::new(&mut rng, SimTime::ZERO);
        ctx.push(Reaction::RestoreResource {
            actor: ActorIndex(0),
            kind: ResourceKind::Mana,
            amount: 74.0,
        });
        ctx.push(Reaction::RemoveAura {
            owner: AuraOwner::Target(TargetIndex::PRIMARY),
            aura: AuraId(3),
        });
        let reactions = ctx.into_reactions();
        assert!(matches!(reactions[0], Reaction::RestoreResource { .. }));
        assert!(matches!(reactions[1], Reaction::RemoveAura { .. }));
    }
}
