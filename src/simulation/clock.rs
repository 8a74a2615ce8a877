//! Discrete-event clock
//!
//! Time only moves forward, straight to the next instant something happens:
//! a cast finishing, a DoT tick, a swing, an aura running out or an actor's
//! rotation asking to be woken. Events sharing an instant are processed in
//! a fixed order (cast completions, DoT ticks, swings, aura expirations;
//! ties broken by index), which keeps iterations reproducible.

use tracing::debug;

use crate::aura::AuraOwner;
use crate::combat::cast::{CastAttempt, RejectReason};
use crate::combat::constants::MAX_OFF_GCD_ACTIONS_PER_STEP;
use crate::core::cancel::CancelToken;
use crate::core::error::{Result, SimError};
use crate::core::types::{ActorIndex, AuraId, SimTime, TargetIndex};
use crate::entity::resources::ResourceKind;
use crate::rotation::{Decision, RotationView};
use crate::simulation::result::IterationResult;
use crate::simulation::Simulation;

/// Something scheduled on the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum WorldEvent {
    CastComplete(ActorIndex),
    DotTick(u64),
    Swing(ActorIndex, usize),
    ActorAuraExpires(ActorIndex, AuraId),
    TargetAuraExpires(TargetIndex, AuraId),
}

impl WorldEvent {
    fn rank(&self) -> u8 {
        match self {
            WorldEvent::CastComplete(_) => 0,
            WorldEvent::DotTick(_) => 1,
            WorldEvent::Swing(..) => 2,
            WorldEvent::ActorAuraExpires(..) | WorldEvent::TargetAuraExpires(..) => 3,
        }
    }
}

impl Simulation {
    /// Run until the encounter ends, every caster is out of mana (with
    /// `exit_on_oom`), or `cancel` fires.
    pub fn run(mut self, cancel: &CancelToken) -> Result<IterationResult> {
        loop {
            if cancel.is_cancelled() {
                return Err(SimError::Aborted);
            }
            self.advance_to(self.now)?;
            if self.now >= self.duration {
                break;
            }
            self.offer_actions()?;
            if self.exit_on_oom && self.all_casters_out_of_mana() {
                debug!(now = ?self.now, "every caster is out of mana, ending iteration");
                break;
            }
            let next = self.next_step();
            self.advance_to(next)?;
        }
        Ok(self.finish())
    }

    /// Process every world event up to and including `until` (but never at
    /// or past the end of the encounter), then move the clock to `until`.
    pub fn advance_to(&mut self, until: SimTime) -> Result<()> {
        let until = until.min(self.duration);
        while let Some((at, event)) = self.next_world_event(until) {
            self.move_clock(at);
            self.process(event)?;
        }
        self.move_clock(until);
        Ok(())
    }

    fn move_clock(&mut self, to: SimTime) {
        if to <= self.now {
            return;
        }
        let elapsed = to - self.now;
        for actor in &mut self.actors {
            let regen = actor.mana_regen_per_second();
            actor.resources.regenerate(elapsed, regen);
        }
        self.now = to;
    }

    /// Earliest pending event at or before `until`, strictly inside the encounter.
    fn next_world_event(&self, until: SimTime) -> Option<(SimTime, WorldEvent)> {
        let mut best: Option<(SimTime, WorldEvent)> = None;
        let mut consider = |at: SimTime, event: WorldEvent| {
            if at > until || at >= self.duration {
                return;
            }
            let better = match &best {
                None => true,
                Some((t, e)) => (at, event.rank(), event) < (*t, e.rank(), *e),
            };
            if better {
                best = Some((at, event));
            }
        };

        for actor in &self.actors {
            if let Some(pending) = &actor.casting {
                consider(pending.completes_at, WorldEvent::CastComplete(actor.index));
            }
            for (slot, auto) in actor.auto_attacks.iter().enumerate() {
                consider(auto.next_swing, WorldEvent::Swing(actor.index, slot));
            }
            for id in actor.auras.expired(until) {
                if let Some(state) = actor.auras.state(id) {
                    consider(state.expires_at, WorldEvent::ActorAuraExpires(actor.index, id));
                }
            }
        }
        for dot in &self.dots {
            if let Some(at) = dot.next_tick_at() {
                consider(at, WorldEvent::DotTick(dot.serial));
            }
        }
        for target in &self.targets {
            for id in target.auras.expired(until) {
                if let Some(state) = target.auras.state(id) {
                    consider(state.expires_at, WorldEvent::TargetAuraExpires(target.index, id));
                }
            }
        }
        best
    }

    fn process(&mut self, event: WorldEvent) -> Result<()> {
        match event {
            WorldEvent::CastComplete(actor) => self.complete_cast(actor),
            WorldEvent::DotTick(serial) => self.tick_dot(serial),
            WorldEvent::Swing(actor, slot) => self.swing(actor, slot),
            WorldEvent::ActorAuraExpires(actor, aura) => {
                self.expire_aura(AuraOwner::Actor(actor), aura, 0)
            }
            WorldEvent::TargetAuraExpires(target, aura) => {
                self.expire_aura(AuraOwner::Target(target), aura, 0)
            }
        }
    }

    /// Next instant worth stopping at: the earliest world event, wake-up or
    /// cooldown (GCD included) coming off strictly after now, capped at the
    /// end of the encounter.
    fn next_step(&self) -> SimTime {
        let mut next = self.duration;
        let mut consider = |at: SimTime| {
            if at > self.now && at < next {
                next = at;
            }
        };

        for actor in &self.actors {
            if let Some(pending) = &actor.casting {
                consider(pending.completes_at);
            }
            if let Some(swing) = actor.next_swing() {
                consider(swing);
            }
            if let Some(expires) = actor.auras.next_expiration() {
                consider(expires);
            }
            if let Some(wake) = actor.wake_at {
                consider(wake);
            }
            if actor.casting.is_none() {
                if let Some(ready) = actor.cooldowns.next_ready_after(self.now) {
                    consider(ready);
                }
            }
        }
        for dot in &self.dots {
            if let Some(at) = dot.next_tick_at() {
                consider(at);
            }
        }
        for target in &self.targets {
            if let Some(expires) = target.auras.next_expiration() {
                consider(expires);
            }
        }
        next
    }

    fn offer_actions(&mut self) -> Result<()> {
        for i in 0..self.actors.len() {
            self.offer(ActorIndex(i))?;
        }
        Ok(())
    }

    /// Consult one actor's rotation until it commits to a cast with a cast
    /// time, waits, or runs out of off-GCD actions for this instant.
    fn offer(&mut self, index: ActorIndex) -> Result<()> {
        for _ in 0..MAX_OFF_GCD_ACTIONS_PER_STEP {
            let decision = {
                let actor = &self.actors[index.0];
                if actor.casting.is_some() {
                    return Ok(());
                }
                let view = RotationView::new(self.now, self.remaining(), actor, &self.targets);
                actor.rotation.choose(&view)
            };

            match decision {
                Decision::Cast { action, target } => match self.try_cast(index, action, target)? {
                    CastAttempt::Cast { .. } => {
                        let actor = &mut self.actors[index.0];
                        actor.out_of_mana = false;
                        actor.wake_at = None;
                    }
                    CastAttempt::Rejected(reason) => {
                        let now = self.now;
                        let actor = &mut self.actors[index.0];
                        debug!(actor = %actor.name, %action, %reason, "rotation choice rejected");
                        if reason == RejectReason::InsufficientResource(ResourceKind::Mana) {
                            actor.mark_out_of_mana(now);
                        }
                        actor.wake_at = actor
                            .ability(action)
                            .and_then(|def| actor.ready_at(def, now))
                            .filter(|at| *at > now);
                        return Ok(());
                    }
                },
                Decision::Wait(at) => {
                    self.actors[index.0].wake_at = (at > self.now).then_some(at);
                    return Ok(());
                }
                Decision::WaitForResource { kind, until } => {
                    let now = self.now;
                    let actor = &mut self.actors[index.0];
                    if kind == ResourceKind::Mana {
                        actor.mark_out_of_mana(now);
                    }
                    actor.wake_at = until.filter(|at| *at > now);
                    return Ok(());
                }
                Decision::Idle => {
                    self.actors[index.0].wake_at = None;
                    return Ok(());
                }
            }
        }
        debug!(actor = %self.actors[index.0].name, now = ?self.now, "action limit reached for this instant");
        Ok(())
    }

    fn all_casters_out_of_mana(&self) -> bool {
        let mut casters = self
            .actors
            .iter()
            .filter(|a| a.resources.has(ResourceKind::Mana))
            .peekable();
        casters.peek().is_some() && casters.all(|a| a.out_of_mana)
    }
}
