//! Applying queued reactions
//!
//! Reactions run in the order they were queued. Anything that starts a new
//! effect (phantom casts, aura removals with expire hooks) goes one level
//! deeper so a self-feeding proc chain stops at the depth limit.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::aura::definition::AuraDef;
use crate::aura::AuraOwner;
use crate::combat::constants::MAX_PROC_DEPTH;
use crate::combat::dot::{DotParams, DotSnapshot, DotState};
use crate::combat::resolution::{magic_crit_chance, magic_hit_chance};
use crate::core::error::{Result, SimError};
use crate::core::stats::Stat;
use crate::core::types::{ActionId, ActorIndex, AuraId, TargetIndex};
use crate::proc::{ProcContext, Reaction};
use crate::simulation::Simulation;

impl Simulation {
    pub(super) fn apply_reactions(&mut self, reactions: Vec<Reaction>, depth: u8) -> Result<()> {
        for reaction in reactions {
            match reaction {
                Reaction::ApplyAura { owner, aura, stacks } => self.apply_aura(owner, &aura, stacks)?,
                Reaction::RemoveAura { owner, aura } => self.expire_aura(owner, aura, depth + 1)?,
                Reaction::CastSpell {
                    caster,
                    action,
                    target,
                } => self.cast_phantom(caster, action, target, depth + 1)?,
                Reaction::ApplyDot {
                    caster,
                    action,
                    target,
                } => self.apply_dot(caster, action, target)?,
                Reaction::RestoreResource { actor, kind, amount } => {
                    self.actor_ref(actor)?;
                    let gained = self.actors[actor.0].resources.restore(kind, amount);
                    debug!(%actor, ?kind, gained, "resource restored");
                }
            }
        }
        Ok(())
    }

    /// Apply or refresh `aura` on `owner`, adding one stack (or setting
    /// `stacks` exactly).
    pub fn apply_aura(&mut self, owner: AuraOwner, aura: &Arc<AuraDef>, stacks: Option<u32>) -> Result<()> {
        self.owner_exists(owner)?;
        let now = self.now;
        let change = match owner {
            AuraOwner::Actor(i) => {
                let actor = &mut self.actors[i.0];
                actor.auras.apply(&mut actor.stats, aura, now, stacks)
            }
            AuraOwner::Target(i) => {
                let target = &mut self.targets[i.0];
                target.auras.apply(&mut target.stats, aura, now, stacks)
            }
        };
        if change.is_new() && self.log_enabled() {
            self.push_log(format!("{} gains {}", owner, aura.label));
        }
        Ok(())
    }

    /// Run the aura's expire hook, then detach it. A no-op if the aura is
    /// not active.
    pub(super) fn expire_aura(&mut self, owner: AuraOwner, id: AuraId, depth: u8) -> Result<()> {
        self.owner_exists(owner)?;
        let set = match owner {
            AuraOwner::Actor(i) => &self.actors[i.0].auras,
            AuraOwner::Target(i) => &self.targets[i.0].auras,
        };
        let Some(state) = set.state(id).copied() else {
            return Ok(());
        };
        let hooks = set.definition(id).and_then(|def| def.hooks.clone());

        let now = self.now;
        let reactions = match hooks {
            Some(hooks) if depth <= MAX_PROC_DEPTH => {
                let mut ctx = ProcContext::new(&mut self.rng, now);
                hooks.on_expire(&state, owner, &mut ctx);
                ctx.into_reactions()
            }
            Some(_) => {
                warn!(%id, depth, "expire chain too deep, skipping expire hook");
                Vec::new()
            }
            None => Vec::new(),
        };

        let removed = match owner {
            AuraOwner::Actor(i) => {
                let actor = &mut self.actors[i.0];
                actor.auras.remove(&mut actor.stats, id, now)
            }
            AuraOwner::Target(i) => {
                let target = &mut self.targets[i.0];
                target.auras.remove(&mut target.stats, id, now)
            }
        };
        if let Some((def, _)) = removed {
            if self.log_enabled() {
                self.push_log(format!("{} loses {}", owner, def.label));
            }
        }
        self.apply_reactions(reactions, depth)
    }

    /// Start (or restart) the DoT of `action` on `target`, snapshotting
    /// the caster's current power and multipliers.
    pub(super) fn apply_dot(&mut self, caster: ActorIndex, action: ActionId, target: TargetIndex) -> Result<()> {
        self.target_exists(target)?;
        let actor = self.actor_ref(caster)?;
        let def = actor
            .ability(action)
            .cloned()
            .ok_or_else(|| SimError::MissingAbility(format!("{} has no ability {}", actor.name, action)))?;
        let spec = def
            .kind
            .dot()
            .ok_or_else(|| SimError::invariant(action, "dot applied by a non-periodic ability"))?;

        let power = if def.school.is_physical() {
            actor.attack_power(false)
        } else {
            actor.spell_power(def.school)
        };
        let target_ref = &self.targets[target.0];
        let snapshot = DotSnapshot {
            damage_per_tick: (spec.tick_damage + power * spec.tick_coefficient)
                * actor.damage_dealt_multiplier(def.school, false)
                * spec.static_multiplier,
            hit_chance: magic_hit_chance(actor.stats.get(Stat::SpellHit) + target_ref.pseudo.bonus_hit_rating_taken),
            crit_chance: magic_crit_chance(
                actor.stats.get(Stat::SpellCrit) + target_ref.pseudo.bonus_crit_rating_taken,
            ),
        };
        if !snapshot.damage_per_tick.is_finite() {
            return Err(SimError::invariant(action, "non-finite dot damage"));
        }

        self.dots.retain(|d| !d.matches(caster, action, target));
        let serial = self.next_dot_serial;
        self.next_dot_serial += 1;
        let params = DotParams {
            action,
            caster,
            target,
            school: def.school,
            marker: spec.marker.id,
            crit_multiplier: spec.crit_multiplier,
            flags: def.flags,
            roll_ticks: spec.roll_ticks,
            interval: spec.interval,
            ticks: spec.ticks,
        };
        self.dots.push(DotState::new(serial, params, snapshot, self.now));
        debug!(%action, %target, per_tick = snapshot.damage_per_tick, "dot applied");

        let marker = Arc::clone(&spec.marker);
        self.apply_aura(AuraOwner::Target(target), &marker, None)
    }

    /// Stop the DoT of `action` on `target` early.
    pub fn cancel_dot(&mut self, caster: ActorIndex, action: ActionId, target: TargetIndex) {
        if let Some(index) = self.dots.iter().position(|d| d.matches(caster, action, target)) {
            self.dots[index].cancel();
            self.finish_dot(index);
        }
    }
}
