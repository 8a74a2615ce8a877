//! Mana, energy and rage pools with their regeneration rules

use serde::{Deserialize, Serialize};

use crate::combat::constants::{
    ENERGY_PER_SECOND, MAX_ENERGY, MAX_RAGE, RAGE_CONVERSION_VALUE, SPIRIT_REGEN_BASE,
    SPIRIT_REGEN_COEFFICIENT,
};
use crate::core::stats::{Stat, Stats};
use crate::core::types::{secs, SimTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Mana,
    Energy,
    Rage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub kind: ResourceKind,
    pub amount: f64,
}

impl ResourceCost {
    pub fn mana(amount: f64) -> Self {
        Self { kind: ResourceKind::Mana, amount }
    }

    pub fn energy(amount: f64) -> Self {
        Self { kind: ResourceKind::Energy, amount }
    }

    pub fn rage(amount: f64) -> Self {
        Self { kind: ResourceKind::Rage, amount }
    }
}

/// Which pools an actor has. Mana capacity comes from the `Mana` stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub mana: bool,
    pub energy: bool,
    pub rage: bool,
    pub starting_rage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pool {
    current: f64,
    max: f64,
}

impl Pool {
    fn full(max: f64) -> Self {
        Self { current: max, max }
    }

    /// Add up to the cap; returns what was actually gained.
    fn add(&mut self, amount: f64) -> f64 {
        let before = self.current;
        self.current = (self.current + amount).clamp(0.0, self.max);
        self.current - before
    }
}

#[derive(Debug, Clone)]
pub struct Resources {
    mana: Option<Pool>,
    energy: Option<Pool>,
    rage: Option<Pool>,
    mana_spent: f64,
    mana_gained: f64,
}

impl Resources {
    pub fn new(config: &ResourceConfig, max_mana: f64) -> Self {
        Self {
            mana: config.mana.then(|| Pool::full(max_mana.max(0.0))),
            energy: config.energy.then(|| Pool::full(MAX_ENERGY)),
            rage: config.rage.then(|| Pool {
                current: config.starting_rage.clamp(0.0, MAX_RAGE),
                max: MAX_RAGE,
            }),
            mana_spent: 0.0,
            mana_gained: 0.0,
        }
    }

    fn pool(&self, kind: ResourceKind) -> Option<&Pool> {
        match kind {
            ResourceKind::Mana => self.mana.as_ref(),
            ResourceKind::Energy => self.energy.as_ref(),
            ResourceKind::Rage => self.rage.as_ref(),
        }
    }

    fn pool_mut(&mut self, kind: ResourceKind) -> Option<&mut Pool> {
        match kind {
            ResourceKind::Mana => self.mana.as_mut(),
            ResourceKind::Energy => self.energy.as_mut(),
            ResourceKind::Rage => self.rage.as_mut(),
        }
    }

    pub fn has(&self, kind: ResourceKind) -> bool {
        self.pool(kind).is_some()
    }

    pub fn current(&self, kind: ResourceKind) -> f64 {
        self.pool(kind).map_or(0.0, |p| p.current)
    }

    pub fn max(&self, kind: ResourceKind) -> f64 {
        self.pool(kind).map_or(0.0, |p| p.max)
    }

    /// Current over max; zero for a missing or empty-capacity pool.
    pub fn fraction(&self, kind: ResourceKind) -> f64 {
        match self.pool(kind) {
            Some(pool) if pool.max > 0.0 => pool.current / pool.max,
            _ => 0.0,
        }
    }

    pub fn can_afford(&self, cost: &ResourceCost) -> bool {
        cost.amount <= 0.0 || self.current(cost.kind) >= cost.amount
    }

    /// Deduct a cost. Returns false (and changes nothing) if unaffordable.
    pub fn spend(&mut self, cost: &ResourceCost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        if cost.amount <= 0.0 {
            return true;
        }
        if let Some(pool) = self.pool_mut(cost.kind) {
            pool.current -= cost.amount;
        }
        if cost.kind == ResourceKind::Mana {
            self.mana_spent += cost.amount;
        }
        true
    }

    /// Restore up to the cap. Actors without the pool gain nothing.
    pub fn restore(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        let gained = self.pool_mut(kind).map_or(0.0, |p| p.add(amount));
        if kind == ResourceKind::Mana {
            self.mana_gained += gained;
        }
        gained
    }

    /// Continuous regeneration over `elapsed`.
    pub fn regenerate(&mut self, elapsed: SimTime, mana_per_second: f64) {
        if elapsed.is_zero() {
            return;
        }
        let dt = elapsed.as_secs_f64();
        if self.mana.is_some() && mana_per_second > 0.0 {
            self.restore(ResourceKind::Mana, mana_per_second * dt);
        }
        if let Some(energy) = self.energy.as_mut() {
            energy.add(ENERGY_PER_SECOND * dt);
        }
    }

    /// Time until `cost` becomes affordable through regeneration alone.
    /// `None` if it never will (rage, or no regeneration).
    pub fn time_to_afford(&self, cost: &ResourceCost, mana_per_second: f64) -> Option<SimTime> {
        if self.can_afford(cost) {
            return Some(SimTime::ZERO);
        }
        let pool = self.pool(cost.kind)?;
        if cost.amount > pool.max {
            return None;
        }
        let rate = match cost.kind {
            ResourceKind::Mana => mana_per_second,
            ResourceKind::Energy => ENERGY_PER_SECOND,
            ResourceKind::Rage => 0.0,
        };
        if rate <= 0.0 {
            return None;
        }
        Some(secs((cost.amount - pool.current) / rate))
    }

    pub fn mana_spent(&self) -> f64 {
        self.mana_spent
    }

    pub fn mana_gained(&self) -> f64 {
        self.mana_gained
    }
}

/// Spirit-based mana regeneration per second.
pub fn spirit_regen_per_second(spirit: f64, intellect: f64) -> f64 {
    SPIRIT_REGEN_BASE + spirit * intellect.max(0.0).sqrt() * SPIRIT_REGEN_COEFFICIENT
}

/// MP5 plus the fraction of spirit regeneration that continues while casting.
pub fn mana_regen_per_second(stats: &Stats, casting_fraction: f64) -> f64 {
    let spirit = spirit_regen_per_second(stats[Stat::Spirit], stats[Stat::Intellect]);
    stats[Stat::Mp5] / 5.0 + spirit * casting_fraction
}

/// Rage generated by a landed white hit.
pub fn rage_from_white_hit(damage: f64, weapon_speed: f64, hit_factor: f64) -> f64 {
    15.0 * damage / (4.0 * RAGE_CONVERSION_VALUE) + hit_factor * weapon_speed / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mana_only(max: f64) -> Resources {
        Resources::new(
            &ResourceConfig {
                mana: true,
                ..ResourceConfig::default()
            },
            max,
        )
    }

    #[test]
    fn test_spend_rejects_without_change() {
        let mut res = mana_only(100.0);
        assert!(!res.spend(&ResourceCost::mana(150.0)));
        assert_eq!(res.current(ResourceKind::Mana), 100.0);
        assert!(res.spend(&ResourceCost::mana(40.0)));
        assert_eq!(res.current(ResourceKind::Mana), 60.0);
        assert_eq!(res.mana_spent(), 40.0);
    }

    #[test]
    fn test_missing_pool_cannot_pay() {
        let res = mana_only(100.0);
        assert!(!res.can_afford(&ResourceCost::energy(10.0)));
        assert!(res.can_afford(&ResourceCost::energy(0.0)));
    }

    #[test]
    fn test_restore_capped() {
        let mut res = mana_only(100.0);
        res.spend(&ResourceCost::mana(30.0));
        assert_eq!(res.restore(ResourceKind::Mana, 74.0), 30.0);
        assert_eq!(res.current(ResourceKind::Mana), 100.0);
    }

    #[test]
    fn test_energy_regenerates_to_cap() {
        let mut res = Resources::new(
            &ResourceConfig {
                energy: true,
                ..ResourceConfig::default()
            },
            0.0,
        );
        res.spend(&ResourceCost::energy(60.0));
        res.regenerate(SimTime::from_secs(2), 0.0);
        assert!((res.current(ResourceKind::Energy) - 60.0).abs() < 1e-9);
        res.regenerate(SimTime::from_secs(10), 0.0);
        assert_eq!(res.current(ResourceKind::Energy), 100.0);
    }

    #[test]
    fn test_time_to_afford() {
        let mut res = Resources::new(
            &ResourceConfig {
                energy: true,
                rage: true,
                ..ResourceConfig::default()
            },
            0.0,
        );
        res.spend(&ResourceCost::energy(100.0));
        assert_eq!(
            res.time_to_afford(&ResourceCost::energy(35.0), 0.0),
            Some(SimTime::from_millis(3500))
        );
        assert_eq!(res.time_to_afford(&ResourceCost::rage(15.0), 0.0), None);
    }

    #[test]
    fn test_spirit_regen_formula() {
        let regen = spirit_regen_per_second(200.0, 400.0);
        assert!((regen - (0.001 + 200.0 * 20.0 * 0.009327)).abs() < 1e-9);
    }

    #[test]
    fn test_rage_from_white_hit() {
        let rage = rage_from_white_hit(1000.0, 3.6, 3.5);
        assert!((rage - (15000.0 / 1098.8 + 6.3)).abs() < 1e-9);
    }
}
