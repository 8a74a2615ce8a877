//! Monotonic ID allocation for aura and cooldown definitions.
//!
//! IDs are handed out once when a definition is built and never regenerated
//! during a run. A process-wide registry is available through
//! [`IdRegistry::global`], but every constructor that needs IDs takes a
//! `&IdRegistry` so tests can use isolated registries.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use crate::core::types::{AuraId, CooldownId};

#[derive(Debug)]
pub struct IdRegistry {
    next_aura_id: AtomicU32,
    /// Starts at 1; 0 is the global cooldown.
    next_cooldown_id: AtomicU32,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self {
            next_aura_id: AtomicU32::new(1),
            next_cooldown_id: AtomicU32::new(1),
        }
    }

    /// Allocate a fresh aura ID.
    pub fn aura_id(&self) -> AuraId {
        AuraId(self.next_aura_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocate a fresh cooldown ID. Never returns [`CooldownId::GCD`].
    pub fn cooldown_id(&self) -> CooldownId {
        CooldownId(self.next_cooldown_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of aura IDs handed out so far.
    pub fn aura_count(&self) -> u32 {
        self.next_aura_id.load(Ordering::Relaxed) - 1
    }

    /// Number of cooldown IDs handed out so far.
    pub fn cooldown_count(&self) -> u32 {
        self.next_cooldown_id.load(Ordering::Relaxed) - 1
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static IdRegistry {
        static REGISTRY: OnceLock<IdRegistry> = OnceLock::new();
        REGISTRY.get_or_init(IdRegistry::new)
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}
