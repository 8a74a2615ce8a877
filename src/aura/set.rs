//! Active auras of one owner
//!
//! Slots keep registration order; hook dispatch walks them in that order.
//! An aura ID occupies at most one slot, so reapplication always refreshes.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::aura::definition::{AuraDef, ModScope};
use crate::aura::hooks::ActiveHook;
use crate::aura::AuraOwner;
use crate::core::stats::StatBlock;
use crate::core::types::{AuraId, SimTime, SpellSchool, NEVER};

/// Runtime state of one active aura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraState {
    pub id: AuraId,
    pub stacks: u32,
    /// Start of the current uninterrupted active span.
    pub applied_at: SimTime,
    /// [`NEVER`] for permanent auras.
    pub expires_at: SimTime,
}

impl AuraState {
    pub fn remaining(&self, now: SimTime) -> SimTime {
        self.expires_at.saturating_sub(now)
    }

    pub fn is_permanent(&self) -> bool {
        self.expires_at == NEVER
    }
}

/// Stack count before and after an activation or removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackChange {
    pub id: AuraId,
    pub old_stacks: u32,
    pub new_stacks: u32,
}

impl StackChange {
    pub fn is_new(&self) -> bool {
        self.old_stacks == 0 && self.new_stacks > 0
    }

    pub fn delta(&self) -> f64 {
        self.new_stacks as f64 - self.old_stacks as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuraHandle(usize);

#[derive(Debug, Clone)]
struct AuraSlot {
    def: Arc<AuraDef>,
    state: Option<AuraState>,
    uptime: SimTime,
}

#[derive(Debug, Clone, Default)]
pub struct AuraSet {
    slots: Vec<AuraSlot>,
    index: AHashMap<AuraId, usize>,
}

impl AuraSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; registering the same ID again returns the
    /// existing handle.
    pub fn register(&mut self, def: Arc<AuraDef>) -> AuraHandle {
        if let Some(&slot) = self.index.get(&def.id) {
            return AuraHandle(slot);
        }
        let slot = self.slots.len();
        self.index.insert(def.id, slot);
        self.slots.push(AuraSlot {
            def,
            state: None,
            uptime: SimTime::ZERO,
        });
        AuraHandle(slot)
    }

    pub fn handle(&self, id: AuraId) -> Option<AuraHandle> {
        self.index.get(&id).copied().map(AuraHandle)
    }

    /// Activate or reapply. Stacking auras gain one stack (up to the
    /// maximum); every reapplication refreshes expiration to `now + duration`.
    pub fn activate(&mut self, handle: AuraHandle, now: SimTime) -> StackChange {
        let old = self.slots[handle.0].state.map_or(0, |s| s.stacks);
        let max = self.slots[handle.0].def.max_stacks.max(1);
        self.set_stacks(handle, now, (old + 1).min(max))
    }

    /// Activate with an explicit stack count (clamped to `1..=max_stacks`).
    pub fn activate_with_stacks(&mut self, handle: AuraHandle, now: SimTime, stacks: u32) -> StackChange {
        let max = self.slots[handle.0].def.max_stacks.max(1);
        self.set_stacks(handle, now, stacks.clamp(1, max))
    }

    fn set_stacks(&mut self, handle: AuraHandle, now: SimTime, stacks: u32) -> StackChange {
        let slot = &mut self.slots[handle.0];
        let expires_at = slot.def.duration.map_or(NEVER, |d| now.saturating_add(d));
        let old_stacks = slot.state.map_or(0, |s| s.stacks);
        let applied_at = slot.state.map_or(now, |s| s.applied_at);
        slot.state = Some(AuraState {
            id: slot.def.id,
            stacks,
            applied_at,
            expires_at,
        });
        if old_stacks == 0 {
            tracing::debug!(aura = %slot.def.label, ?now, "aura gained");
        }
        StackChange {
            id: slot.def.id,
            old_stacks,
            new_stacks: stacks,
        }
    }

    /// Register, activate and fold the stat delta into the owner's stats.
    pub fn apply(
        &mut self,
        stats: &mut StatBlock,
        def: &Arc<AuraDef>,
        now: SimTime,
        stacks: Option<u32>,
    ) -> StackChange {
        let handle = self.register(Arc::clone(def));
        let change = match stacks {
            Some(stacks) => self.activate_with_stacks(handle, now, stacks),
            None => self.activate(handle, now),
        };
        let def = &self.slots[handle.0].def;
        if change.delta() != 0.0 && !def.stats_per_stack.is_zero() {
            stats.add_bonus(&(def.stats_per_stack * change.delta()));
        }
        change
    }

    /// Detach an active aura, record its uptime and take its stats back off
    /// the owner. Returns what was removed so the caller can report it.
    pub fn remove(
        &mut self,
        stats: &mut StatBlock,
        id: AuraId,
        now: SimTime,
    ) -> Option<(Arc<AuraDef>, AuraState)> {
        let &slot_index = self.index.get(&id)?;
        let slot = &mut self.slots[slot_index];
        let state = slot.state.take()?;
        let end = now.min(state.expires_at);
        slot.uptime += end.saturating_sub(state.applied_at);
        if !slot.def.stats_per_stack.is_zero() {
            stats.add_bonus(&(slot.def.stats_per_stack * -(state.stacks as f64)));
        }
        tracing::debug!(aura = %slot.def.label, ?now, "aura removed");
        Some((Arc::clone(&slot.def), state))
    }

    /// IDs of auras whose expiration is at or before `now`, in registration order.
    pub fn expired(&self, now: SimTime) -> Vec<AuraId> {
        self.slots
            .iter()
            .filter_map(|slot| slot.state)
            .filter(|state| state.expires_at <= now)
            .map(|state| state.id)
            .collect()
    }

    pub fn next_expiration(&self) -> Option<SimTime> {
        self.slots
            .iter()
            .filter_map(|slot| slot.state)
            .map(|state| state.expires_at)
            .filter(|t| *t != NEVER)
            .min()
    }

    pub fn state(&self, id: AuraId) -> Option<&AuraState> {
        self.index
            .get(&id)
            .and_then(|&slot| self.slots[slot].state.as_ref())
    }

    pub fn definition(&self, id: AuraId) -> Option<&Arc<AuraDef>> {
        self.index.get(&id).map(|&slot| &self.slots[slot].def)
    }

    pub fn is_active(&self, id: AuraId) -> bool {
        self.state(id).is_some()
    }

    pub fn stacks(&self, id: AuraId) -> u32 {
        self.state(id).map_or(0, |s| s.stacks)
    }

    /// Zero when inactive.
    pub fn remaining(&self, id: AuraId, now: SimTime) -> SimTime {
        self.state(id).map_or(SimTime::ZERO, |s| s.remaining(now))
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.state.is_some()).count()
    }

    /// Hooks of active auras, in registration order.
    pub fn active_hooks(&self, owner: AuraOwner) -> Vec<ActiveHook> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let state = slot.state?;
                let hooks = slot.def.hooks.as_ref()?;
                Some(ActiveHook {
                    hooks: Arc::clone(hooks),
                    state,
                    owner,
                })
            })
            .collect()
    }

    /// Product of all active multipliers of `scope` that cover `school`.
    pub fn multiplier(&self, scope: ModScope, school: SpellSchool) -> f64 {
        self.slots
            .iter()
            .filter(|slot| slot.state.is_some())
            .flat_map(|slot| slot.def.multipliers.iter())
            .filter(|m| m.applies(scope, school))
            .map(|m| m.value)
            .product()
    }

    /// Cumulative active time of `id` up to `now`, including the current span.
    pub fn uptime(&self, id: AuraId, now: SimTime) -> SimTime {
        let Some(&slot_index) = self.index.get(&id) else {
            return SimTime::ZERO;
        };
        let slot = &self.slots[slot_index];
        let current = slot.state.map_or(SimTime::ZERO, |s| {
            now.min(s.expires_at).saturating_sub(s.applied_at)
        });
        slot.uptime + current
    }

    /// Uptime of every registered aura, in registration order.
    pub fn uptimes(&self, now: SimTime) -> Vec<(Arc<AuraDef>, SimTime)> {
        self.slots
            .iter()
            .map(|slot| (Arc::clone(&slot.def), self.uptime(slot.def.id, now)))
            .collect()
    }
}
