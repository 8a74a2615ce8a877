//! Action-selection policies
//!
//! The clock asks an actor's [`Rotation`] what to do whenever the actor is
//! free to act. Policies only read state through a [`RotationView`] and answer
//! with a [`Decision`]; they never mutate the simulation.

pub mod priority;

use std::fmt;

use crate::core::types::{ActionId, AuraId, SimTime, TargetIndex};
use crate::entity::character::Character;
use crate::entity::resources::ResourceKind;
use crate::entity::target::Target;

pub use priority::{Condition, PriorityEntry, PriorityRotation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Cast { action: ActionId, target: TargetIndex },
    /// Ask again at this time (or at the next event if sooner).
    Wait(SimTime),
    /// Blocked on a resource. `until` is when regeneration alone makes the
    /// chosen ability affordable, if it ever does.
    WaitForResource {
        kind: ResourceKind,
        until: Option<SimTime>,
    },
    /// Nothing useful to do until something else happens.
    Idle,
}

/// Read-only state handed to a rotation.
pub struct RotationView<'a> {
    pub now: SimTime,
    pub remaining: SimTime,
    pub actor: &'a Character,
    pub targets: &'a [Target],
}

impl<'a> RotationView<'a> {
    pub fn new(now: SimTime, remaining: SimTime, actor: &'a Character, targets: &'a [Target]) -> Self {
        Self {
            now,
            remaining,
            actor,
            targets,
        }
    }

    pub fn can_cast(&self, action: ActionId) -> bool {
        self.actor
            .ability(action)
            .is_some_and(|def| self.actor.check_cast(def, self.now).is_none())
    }

    /// Earliest time `action` could start, or `None` if it never will.
    pub fn ready_at(&self, action: ActionId) -> Option<SimTime> {
        let def = self.actor.ability(action)?;
        self.actor.ready_at(def, self.now)
    }

    pub fn target_aura_remaining(&self, target: TargetIndex, aura: AuraId) -> SimTime {
        self.targets
            .get(target.0)
            .map_or(SimTime::ZERO, |t| t.auras.remaining(aura, self.now))
    }

    pub fn own_aura_remaining(&self, aura: AuraId) -> SimTime {
        self.actor.auras.remaining(aura, self.now)
    }

    pub fn resource_fraction(&self, kind: ResourceKind) -> f64 {
        self.actor.resources.fraction(kind)
    }
}

/// Decision policy of one actor.
pub trait Rotation: Send + Sync + fmt::Debug {
    fn choose(&self, view: &RotationView<'_>) -> Decision;

    /// Abilities the policy may choose; checked against the actor's
    /// abilities at setup.
    fn referenced_abilities(&self) -> Vec<ActionId> {
        Vec::new()
    }
}

/// Never acts. Useful for auto-attack-only actors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRotation;

impl Rotation for NoRotation {
    fn choose(&self, _view: &RotationView<'_>) -> Decision {
        Decision::Idle
    }
}
