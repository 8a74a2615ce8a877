//! Starting and finishing casts
//!
//! A rotation-chosen cast is checked (casting, GCD, cooldowns, resource),
//! pays its cost and starts its timers when it begins. Instants resolve on
//! the spot; everything else resolves when its completion event fires.
//! Phantom casts requested by procs skip every check and resolve at once.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::aura::AuraOwner;
use crate::combat::ability::AbilityDef;
use crate::combat::cast::CastAttempt;
use crate::combat::constants::MAX_PROC_DEPTH;
use crate::core::error::{Result, SimError};
use crate::core::types::{ActionId, ActorIndex, CooldownId, TargetIndex};
use crate::entity::character::PendingCast;
use crate::proc::ProcContext;
use crate::simulation::Simulation;

impl Simulation {
    fn ability_of(&self, caster: ActorIndex, action: ActionId) -> Result<Arc<AbilityDef>> {
        let actor = self.actor_ref(caster)?;
        actor.ability(action).cloned().ok_or_else(|| {
            SimError::MissingAbility(format!("{} has no ability {}", actor.name, action))
        })
    }

    /// Attempt to start `action` at the current instant.
    ///
    /// A rejection leaves every resource and timer untouched.
    pub fn try_cast(
        &mut self,
        caster: ActorIndex,
        action: ActionId,
        target: TargetIndex,
    ) -> Result<CastAttempt> {
        let def = self.ability_of(caster, action)?;
        let now = self.now;

        let actor = &self.actors[caster.0];
        if let Some(reason) = actor.check_cast(&def, now) {
            return Ok(CastAttempt::Rejected(reason));
        }

        let mut timing = actor.cast_timing(&def, self.gcd_min);
        let hooks = actor.auras.active_hooks(AuraOwner::Actor(caster));
        let reactions = {
            let mut ctx = ProcContext::new(&mut self.rng, now);
            for hook in &hooks {
                hook.cast_start(&mut timing, &mut ctx);
            }
            ctx.into_reactions()
        };

        let actor = &mut self.actors[caster.0];
        if let Some(cost) = &def.cost {
            actor.resources.spend(cost);
        }
        for cd in def.cooldowns() {
            actor.cooldowns.start(cd.id, now, cd.duration);
        }
        if def.triggers_gcd() && !timing.gcd.is_zero() {
            actor.cooldowns.start(CooldownId::GCD, now, timing.gcd);
        }
        self.metrics.entry(def.id).or_default().record_cast();

        let completes_at = now.saturating_add(timing.cast_time);
        if timing.cast_time.is_zero() {
            if self.log_enabled() {
                let line = format!("{} casts {}", self.actors[caster.0].name, def.name);
                self.push_log(line);
            }
            self.apply_reactions(reactions, 0)?;
            self.resolve_cast(caster, &def, target, false, 0)?;
        } else {
            self.actors[caster.0].casting = Some(PendingCast {
                action,
                target,
                started_at: now,
                completes_at,
            });
            if self.log_enabled() {
                let line = format!(
                    "{} begins casting {} ({:.2}s)",
                    self.actors[caster.0].name,
                    def.name,
                    timing.cast_time.as_secs_f64()
                );
                self.push_log(line);
            }
            self.apply_reactions(reactions, 0)?;
        }
        Ok(CastAttempt::Cast { completes_at })
    }

    pub(super) fn complete_cast(&mut self, caster: ActorIndex) -> Result<()> {
        let Some(pending) = self.actors[caster.0].casting.take() else {
            return Ok(());
        };
        let def = self.ability_of(caster, pending.action)?;
        self.actors[caster.0].wake_at = None;
        if self.log_enabled() {
            let line = format!("{} completes {}", self.actors[caster.0].name, def.name);
            self.push_log(line);
        }
        self.resolve_cast(caster, &def, pending.target, false, 0)
    }

    /// Cast requested by a proc. Free, off the GCD and instant.
    pub(super) fn cast_phantom(
        &mut self,
        caster: ActorIndex,
        action: ActionId,
        target: TargetIndex,
        depth: u8,
    ) -> Result<()> {
        if depth > MAX_PROC_DEPTH {
            warn!(%action, depth, "proc chain too deep, dropping phantom cast");
            return Ok(());
        }
        let def = self.ability_of(caster, action)?;
        self.metrics.entry(def.id).or_default().record_cast();
        self.resolve_cast(caster, &def, target, true, depth)
    }

    /// Resolve one cast against every target it strikes.
    fn resolve_cast(
        &mut self,
        caster: ActorIndex,
        def: &Arc<AbilityDef>,
        chosen: TargetIndex,
        phantom: bool,
        depth: u8,
    ) -> Result<()> {
        for target in def.targets.resolve(chosen, self.targets.len()) {
            self.resolve_effect(caster, def, target, phantom, depth)?;
        }
        Ok(())
    }

    /// Swing one hand and schedule its next swing from the current haste.
    pub(super) fn swing(&mut self, caster: ActorIndex, slot: usize) -> Result<()> {
        let now = self.now;
        let actor = &mut self.actors[caster.0];
        let Some(auto) = actor.auto_attacks.get(slot) else {
            return Ok(());
        };
        let (ability, hand) = (Arc::clone(&auto.ability), auto.hand);
        let interval = actor
            .swing_interval(hand)
            .ok_or_else(|| SimError::invariant(ability.id, "auto attack without a weapon"))?;
        actor.auto_attacks[slot].next_swing = now.saturating_add(interval);
        debug!(actor = %actor.name, ?hand, ?now, "swing");

        self.metrics.entry(ability.id).or_default().record_cast();
        self.resolve_effect(caster, &ability, TargetIndex::PRIMARY, false, 0)
    }
}
