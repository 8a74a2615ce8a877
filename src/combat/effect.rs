//! Per-target effect state threaded through the resolution pipeline

use serde::{Deserialize, Serialize};

use crate::combat::outcome::{HitOutcome, OutcomeRollCategory, ProcMask};
use crate::core::error::{Result, SimError};
use crate::core::types::{ActionId, ActorIndex, SimTime, SpellSchool, TargetIndex};

/// Bonus values accumulated by before-hit hooks.
///
/// Owned by the [`Effect`] and lent mutably to each hook in turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectModifiers {
    pub bonus_hit_rating: f64,
    pub bonus_crit_rating: f64,
    pub bonus_power: f64,
    pub bonus_flat_damage: f64,
    pub damage_multiplier: f64,
}

impl Default for EffectModifiers {
    fn default() -> Self {
        Self {
            bonus_hit_rating: 0.0,
            bonus_crit_rating: 0.0,
            bonus_power: 0.0,
            bonus_flat_damage: 0.0,
            damage_multiplier: 1.0,
        }
    }
}

impl EffectModifiers {
    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &EffectModifiers) {
        self.bonus_hit_rating += other.bonus_hit_rating;
        self.bonus_crit_rating += other.bonus_crit_rating;
        self.bonus_power += other.bonus_power;
        self.bonus_flat_damage += other.bonus_flat_damage;
        self.damage_multiplier *= other.damage_multiplier;
    }
}

/// Read-only description of a hit, visible to hooks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitContext {
    pub action: ActionId,
    pub caster: ActorIndex,
    pub target: TargetIndex,
    pub school: SpellSchool,
    pub roll: OutcomeRollCategory,
    pub proc_mask: ProcMask,
    pub periodic: bool,
    /// Triggered by a proc rather than chosen by the rotation.
    pub phantom: bool,
    /// Speed of the weapon that struck, for procs-per-minute triggers.
    pub weapon_speed: Option<f64>,
    pub now: SimTime,
}

/// A finished effect, as seen by on-hit listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub hit: HitContext,
    pub outcome: HitOutcome,
    pub damage: f64,
    pub threat: f64,
}

impl HitEvent {
    pub fn landed(&self) -> bool {
        self.outcome.landed()
    }
}

/// One target struck by one cast.
#[derive(Debug, Clone)]
pub struct Effect {
    pub target: TargetIndex,
    pub mods: EffectModifiers,
    outcome: Option<HitOutcome>,
    pub damage: f64,
    pub threat: f64,
}

impl Effect {
    pub fn new(target: TargetIndex) -> Self {
        Self {
            target,
            mods: EffectModifiers::default(),
            outcome: None,
            damage: 0.0,
            threat: 0.0,
        }
    }

    /// Decide the outcome. Deciding it a second time is a bug in the pipeline.
    pub fn set_outcome(&mut self, action: ActionId, outcome: HitOutcome) -> Result<()> {
        if let Some(existing) = self.outcome {
            return Err(SimError::invariant(
                action,
                format!("outcome decided twice ({} then {})", existing, outcome),
            ));
        }
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Add a partial-resist tag to an already decided outcome.
    pub fn tag_partial(&mut self, action: ActionId, tag: HitOutcome) -> Result<()> {
        match self.outcome.as_mut() {
            Some(outcome) if tag.is_empty() || HitOutcome::PARTIAL.contains(tag) => {
                *outcome |= tag;
                Ok(())
            }
            Some(_) => Err(SimError::invariant(action, format!("{} is not a resist tag", tag))),
            None => Err(SimError::invariant(action, "resist tagged before outcome")),
        }
    }

    pub fn outcome(&self) -> HitOutcome {
        self.outcome.unwrap_or(HitOutcome::NONE)
    }

    pub fn is_decided(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn landed(&self) -> bool {
        self.outcome().landed()
    }

    pub fn to_event(&self, hit: HitContext) -> HitEvent {
        HitEvent {
            hit,
            outcome: self.outcome(),
            damage: self.damage,
            threat: self.threat,
        }
    }
}
