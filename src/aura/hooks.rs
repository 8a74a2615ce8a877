//! Named hook points an aura can listen on

use std::fmt;
use std::sync::Arc;

use crate::aura::set::AuraState;
use crate::aura::AuraOwner;
use crate::combat::effect::{EffectModifiers, HitContext, HitEvent};
use crate::core::types::{ActionId, SimTime, SpellSchool};
use crate::proc::ProcContext;

/// Timing of a cast about to start. Hooks may shorten it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastTiming {
    pub action: ActionId,
    pub school: SpellSchool,
    pub cast_time: SimTime,
    pub gcd: SimTime,
}

/// Pipeline callbacks. Every method defaults to a no-op.
///
/// Hooks never touch simulation state directly: before-hit hooks write into
/// the borrowed accumulator and reactive hooks queue [`Reaction`]s on the
/// context, which the simulation applies after the dispatch completes.
///
/// [`Reaction`]: crate::proc::Reaction
pub trait AuraHooks: Send + Sync + fmt::Debug {
    fn on_before_hit(&self, _aura: &AuraState, _hit: &HitContext, _mods: &mut EffectModifiers) {}

    fn on_hit(
        &self,
        _aura: &AuraState,
        _owner: AuraOwner,
        _event: &HitEvent,
        _ctx: &mut ProcContext<'_>,
    ) {
    }

    fn on_before_periodic(&self, _aura: &AuraState, _hit: &HitContext, _damage: &mut f64) {}

    fn on_periodic(
        &self,
        _aura: &AuraState,
        _owner: AuraOwner,
        _event: &HitEvent,
        _ctx: &mut ProcContext<'_>,
    ) {
    }

    fn on_expire(&self, _aura: &AuraState, _owner: AuraOwner, _ctx: &mut ProcContext<'_>) {}

    fn on_cast_start(
        &self,
        _aura: &AuraState,
        _owner: AuraOwner,
        _timing: &mut CastTiming,
        _ctx: &mut ProcContext<'_>,
    ) {
    }
}

/// Hooks of one active aura, detached from the owning set so they can run
/// while the simulation is mutably borrowed elsewhere.
#[derive(Debug, Clone)]
pub struct ActiveHook {
    pub hooks: Arc<dyn AuraHooks>,
    pub state: AuraState,
    pub owner: AuraOwner,
}

impl ActiveHook {
    pub fn before_hit(&self, hit: &HitContext, mods: &mut EffectModifiers) {
        self.hooks.on_before_hit(&self.state, hit, mods);
    }

    pub fn before_periodic(&self, hit: &HitContext, damage: &mut f64) {
        self.hooks.on_before_periodic(&self.state, hit, damage);
    }

    /// Routes to `on_periodic` for ticks and `on_hit` otherwise.
    pub fn after_hit(&self, event: &HitEvent, ctx: &mut ProcContext<'_>) {
        if event.hit.periodic {
            self.hooks.on_periodic(&self.state, self.owner, event, ctx);
        } else {
            self.hooks.on_hit(&self.state, self.owner, event, ctx);
        }
    }

    pub fn cast_start(&self, timing: &mut CastTiming, ctx: &mut ProcContext<'_>) {
        self.hooks.on_cast_start(&self.state, self.owner, timing, ctx);
    }
}
