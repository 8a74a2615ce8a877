//! Damage-over-time runtime state
//!
//! A DoT moves Applied -> Ticking -> Completed. Damage per tick and the
//! roll chances are snapshotted on application and never recomputed.

use serde::{Deserialize, Serialize};

use crate::combat::outcome::SpellFlags;
use crate::core::types::{ActionId, ActorIndex, AuraId, SimTime, SpellSchool, TargetIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DotPhase {
    Applied,
    Ticking,
    Completed,
}

/// Values locked in when the DoT lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotSnapshot {
    pub damage_per_tick: f64,
    pub hit_chance: f64,
    pub crit_chance: f64,
}

#[derive(Debug, Clone)]
pub struct DotState {
    /// Unique within an iteration; orders ticks that fall on the same instant.
    pub serial: u64,
    pub action: ActionId,
    pub caster: ActorIndex,
    pub target: TargetIndex,
    pub school: SpellSchool,
    pub marker: AuraId,
    pub snapshot: DotSnapshot,
    pub crit_multiplier: f64,
    pub flags: SpellFlags,
    pub roll_ticks: bool,
    pub interval: SimTime,
    pub ticks_total: u32,
    pub ticks_done: u32,
    next_tick: SimTime,
    phase: DotPhase,
}

/// Everything needed to start a DoT besides its snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DotParams {
    pub action: ActionId,
    pub caster: ActorIndex,
    pub target: TargetIndex,
    pub school: SpellSchool,
    pub marker: AuraId,
    pub crit_multiplier: f64,
    pub flags: SpellFlags,
    pub roll_ticks: bool,
    pub interval: SimTime,
    pub ticks: u32,
}

impl DotState {
    pub fn new(serial: u64, params: DotParams, snapshot: DotSnapshot, now: SimTime) -> Self {
        Self {
            serial,
            action: params.action,
            caster: params.caster,
            target: params.target,
            school: params.school,
            marker: params.marker,
            snapshot,
            crit_multiplier: params.crit_multiplier,
            flags: params.flags,
            roll_ticks: params.roll_ticks,
            interval: params.interval,
            ticks_total: params.ticks,
            ticks_done: 0,
            next_tick: now.saturating_add(params.interval),
            phase: DotPhase::Applied,
        }
    }

    pub fn phase(&self) -> DotPhase {
        self.phase
    }

    /// `None` once completed.
    pub fn next_tick_at(&self) -> Option<SimTime> {
        (self.phase != DotPhase::Completed).then_some(self.next_tick)
    }

    pub fn is_due(&self, now: SimTime) -> bool {
        self.next_tick_at().is_some_and(|t| t <= now)
    }

    /// Record one tick. Returns true if that was the last one.
    pub fn advance(&mut self) -> bool {
        if self.phase == DotPhase::Completed {
            return true;
        }
        self.ticks_done += 1;
        if self.ticks_done >= self.ticks_total {
            self.phase = DotPhase::Completed;
            true
        } else {
            self.phase = DotPhase::Ticking;
            self.next_tick = self.next_tick.saturating_add(self.interval);
            false
        }
    }

    pub fn cancel(&mut self) {
        self.phase = DotPhase::Completed;
    }

    pub fn remaining_ticks(&self) -> u32 {
        if self.phase == DotPhase::Completed {
            0
        } else {
            self.ticks_total - self.ticks_done
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == DotPhase::Completed
    }

    pub fn matches(&self, caster: ActorIndex, action: ActionId, target: TargetIndex) -> bool {
        self.caster == caster && self.action == action && self.target == target
    }
}
