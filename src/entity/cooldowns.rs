//! Cooldown timers keyed by cooldown ID
//!
//! Timers store the instant the cooldown clears. Abilities that share a
//! cooldown ID share the timer.

use ahash::AHashMap;

use crate::core::types::{CooldownId, SimTime};

#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    ready_at: AHashMap<CooldownId, SimTime>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `id` clears. Unused timers are ready from the start.
    pub fn ready_at(&self, id: CooldownId) -> SimTime {
        self.ready_at.get(&id).copied().unwrap_or(SimTime::ZERO)
    }

    pub fn is_ready(&self, id: CooldownId, now: SimTime) -> bool {
        self.ready_at(id) <= now
    }

    pub fn start(&mut self, id: CooldownId, now: SimTime, duration: SimTime) {
        self.ready_at.insert(id, now.saturating_add(duration));
    }

    pub fn reset(&mut self, id: CooldownId) {
        self.ready_at.remove(&id);
    }

    /// Earliest timer clearing strictly after `now`.
    pub fn next_ready_after(&self, now: SimTime) -> Option<SimTime> {
        self.ready_at.values().copied().filter(|t| *t > now).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_timer() {
        let shared = CooldownId(7);
        let mut cds = Cooldowns::new();
        assert!(cds.is_ready(shared, SimTime::ZERO));

        cds.start(shared, SimTime::ZERO, SimTime::from_secs(6));
        assert!(!cds.is_ready(shared, SimTime::from_secs(5)));
        assert!(cds.is_ready(shared, SimTime::from_secs(6)));
        assert_eq!(cds.next_ready_after(SimTime::from_secs(1)), Some(SimTime::from_secs(6)));
        assert_eq!(cds.next_ready_after(SimTime::from_secs(6)), None);

        cds.reset(shared);
        assert!(cds.is_ready(shared, SimTime::from_secs(1)));
    }
}
