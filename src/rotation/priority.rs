//! Data-driven priority list
//!
//! Entries are tried top to bottom; the first whose condition holds and
//! which can start right now is cast. If none can, the rotation waits for the
//! earliest entry that will become usable.

use serde::{Deserialize, Serialize};

use crate::core::types::{secs, ActionId, AuraId, CooldownId, SimTime, TargetIndex};
use crate::entity::resources::ResourceKind;
use crate::rotation::{Decision, Rotation, RotationView};

/// When an entry is eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    /// The aura on the entry's target is missing or about to fall off.
    TargetAuraMissing {
        aura: AuraId,
        #[serde(default)]
        refresh_within_secs: f64,
    },
    OwnAuraMissing {
        aura: AuraId,
        #[serde(default)]
        refresh_within_secs: f64,
    },
    ResourceAbove { resource: ResourceKind, fraction: f64 },
    CooldownReady { cooldown: CooldownId },
    FightRemainingAbove { secs: f64 },
}

impl Condition {
    /// When the condition holds: `now` if it already does, a future time if
    /// it becomes true by itself, `None` if only another event can change it.
    fn holds_at(&self, view: &RotationView<'_>, target: TargetIndex) -> Option<SimTime> {
        let now = view.now;
        match *self {
            Condition::Always => Some(now),
            Condition::TargetAuraMissing {
                aura,
                refresh_within_secs,
            } => {
                let remaining = view.target_aura_remaining(target, aura);
                Some(now + remaining.saturating_sub(secs(refresh_within_secs)))
            }
            Condition::OwnAuraMissing {
                aura,
                refresh_within_secs,
            } => {
                let remaining = view.own_aura_remaining(aura);
                Some(now + remaining.saturating_sub(secs(refresh_within_secs)))
            }
            Condition::ResourceAbove { resource, fraction } => {
                (view.resource_fraction(resource) > fraction).then_some(now)
            }
            Condition::CooldownReady { cooldown } => {
                Some(view.actor.cooldowns.ready_at(cooldown).max(now))
            }
            Condition::FightRemainingAbove { secs: threshold } => {
                (view.remaining > secs(threshold)).then_some(now)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub action: ActionId,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub target: TargetIndex,
}

impl PriorityEntry {
    pub fn always(action: ActionId) -> Self {
        Self {
            action,
            condition: Condition::Always,
            target: TargetIndex::PRIMARY,
        }
    }

    pub fn when(action: ActionId, condition: Condition) -> Self {
        Self {
            action,
            condition,
            target: TargetIndex::PRIMARY,
        }
    }

    pub fn on_target(mut self, target: TargetIndex) -> Self {
        self.target = target;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityRotation {
    pub entries: Vec<PriorityEntry>,
}

impl PriorityRotation {
    pub fn new(entries: Vec<PriorityEntry>) -> Self {
        Self { entries }
    }
}

impl Rotation for PriorityRotation {
    fn choose(&self, view: &RotationView<'_>) -> Decision {
        let mut earliest: Option<(SimTime, &PriorityEntry)> = None;
        let mut starved: Option<ResourceKind> = None;

        for entry in &self.entries {
            let Some(eligible_at) = entry.condition.holds_at(view, entry.target) else {
                continue;
            };
            if eligible_at <= view.now && view.can_cast(entry.action) {
                return Decision::Cast {
                    action: entry.action,
                    target: entry.target,
                };
            }
            match view.ready_at(entry.action) {
                Some(ready) => {
                    let at = ready.max(eligible_at);
                    if earliest.map_or(true, |(t, _)| at < t) {
                        earliest = Some((at, entry));
                    }
                }
                None => {
                    if starved.is_none() {
                        starved = view
                            .actor
                            .ability(entry.action)
                            .and_then(|def| def.cost)
                            .map(|cost| cost.kind);
                    }
                }
            }
        }

        match (earliest, starved) {
            (Some((at, entry)), _) => {
                let blocked_on = view
                    .actor
                    .ability(entry.action)
                    .and_then(|def| def.cost)
                    .filter(|cost| !view.actor.resources.can_afford(cost));
                match blocked_on {
                    Some(cost) => Decision::WaitForResource {
                        kind: cost.kind,
                        until: Some(at),
                    },
                    None => Decision::Wait(at),
                }
            }
            (None, Some(kind)) => Decision::WaitForResource { kind, until: None },
            (None, None) => Decision::Idle,
        }
    }

    fn referenced_abilities(&self) -> Vec<ActionId> {
        self.entries.iter().map(|e| e.action).collect()
    }
}
