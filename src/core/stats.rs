//! Flat stat vectors and linear stat dependencies

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::SpellSchool;

/// A named character stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Strength,
    Agility,
    Stamina,
    Intellect,
    Spirit,
    SpellCrit,
    SpellHit,
    Healing,
    SpellPower,
    SpellHaste,
    Mp5,
    SpellPenetration,
    FireSpellPower,
    NatureSpellPower,
    FrostSpellPower,
    ShadowSpellPower,
    HolySpellPower,
    ArcaneSpellPower,
    AttackPower,
    RangedAttackPower,
    MeleeHit,
    MeleeHaste,
    MeleeCrit,
    Expertise,
    ArmorPenetration,
    Mana,
    Energy,
    Rage,
    Armor,
}

impl Stat {
    pub const COUNT: usize = 29;

    pub const ALL: [Stat; Self::COUNT] = [
        Stat::Strength,
        Stat::Agility,
        Stat::Stamina,
        Stat::Intellect,
        Stat::Spirit,
        Stat::SpellCrit,
        Stat::SpellHit,
        Stat::Healing,
        Stat::SpellPower,
        Stat::SpellHaste,
        Stat::Mp5,
        Stat::SpellPenetration,
        Stat::FireSpellPower,
        Stat::NatureSpellPower,
        Stat::FrostSpellPower,
        Stat::ShadowSpellPower,
        Stat::HolySpellPower,
        Stat::ArcaneSpellPower,
        Stat::AttackPower,
        Stat::RangedAttackPower,
        Stat::MeleeHit,
        Stat::MeleeHaste,
        Stat::MeleeCrit,
        Stat::Expertise,
        Stat::ArmorPenetration,
        Stat::Mana,
        Stat::Energy,
        Stat::Rage,
        Stat::Armor,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// School-specific spell power stat, if the school has one.
    pub fn school_power(school: SpellSchool) -> Option<Stat> {
        match school {
            SpellSchool::Physical => None,
            SpellSchool::Arcane => Some(Stat::ArcaneSpellPower),
            SpellSchool::Fire => Some(Stat::FireSpellPower),
            SpellSchool::Frost => Some(Stat::FrostSpellPower),
            SpellSchool::Holy => Some(Stat::HolySpellPower),
            SpellSchool::Nature => Some(Stat::NatureSpellPower),
            SpellSchool::Shadow => Some(Stat::ShadowSpellPower),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stat::Strength => "Strength",
            Stat::Agility => "Agility",
            Stat::Stamina => "Stamina",
            Stat::Intellect => "Intellect",
            Stat::Spirit => "Spirit",
            Stat::SpellCrit => "SpellCrit",
            Stat::SpellHit => "SpellHit",
            Stat::Healing => "Healing",
            Stat::SpellPower => "SpellPower",
            Stat::SpellHaste => "SpellHaste",
            Stat::Mp5 => "MP5",
            Stat::SpellPenetration => "SpellPenetration",
            Stat::FireSpellPower => "FireSpellPower",
            Stat::NatureSpellPower => "NatureSpellPower",
            Stat::FrostSpellPower => "FrostSpellPower",
            Stat::ShadowSpellPower => "ShadowSpellPower",
            Stat::HolySpellPower => "HolySpellPower",
            Stat::ArcaneSpellPower => "ArcaneSpellPower",
            Stat::AttackPower => "AttackPower",
            Stat::RangedAttackPower => "RangedAttackPower",
            Stat::MeleeHit => "MeleeHit",
            Stat::MeleeHaste => "MeleeHaste",
            Stat::MeleeCrit => "MeleeCrit",
            Stat::Expertise => "Expertise",
            Stat::ArmorPenetration => "ArmorPenetration",
            Stat::Mana => "Mana",
            Stat::Energy => "Energy",
            Stat::Rage => "Rage",
            Stat::Armor => "Armor",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dense stat vector. Serialized as a map of the non-zero entries.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Stat, f64>", into = "BTreeMap<Stat, f64>")]
pub struct Stats([f64; Stat::COUNT]);

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Stat, f64)>,
    {
        let mut stats = Self::new();
        for (stat, value) in pairs {
            stats[stat] += value;
        }
        stats
    }

    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        self[stat] = value;
        self
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Non-zero entries in stat order.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::ALL
            .iter()
            .map(move |stat| (*stat, self.0[stat.index()]))
            .filter(|(_, v)| *v != 0.0)
    }

    /// Reject NaN, infinite and negative values (input stat vectors only).
    pub fn validate(&self) -> Result<()> {
        for stat in Stat::ALL {
            let value = self[stat];
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidStat {
                    stat: stat.name().to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Index<Stat> for Stats {
    type Output = f64;

    fn index(&self, stat: Stat) -> &f64 {
        &self.0[stat.index()]
    }
}

impl IndexMut<Stat> for Stats {
    fn index_mut(&mut self, stat: Stat) -> &mut f64 {
        &mut self.0[stat.index()]
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self += rhs;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += *b;
        }
    }
}

impl Sub for Stats {
    type Output = Stats;

    fn sub(mut self, rhs: Stats) -> Stats {
        self -= rhs;
        self
    }
}

impl SubAssign for Stats {
    fn sub_assign(&mut self, rhs: Stats) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a -= *b;
        }
    }
}

impl Mul<f64> for Stats {
    type Output = Stats;

    fn mul(mut self, rhs: f64) -> Stats {
        for v in self.0.iter_mut() {
            *v *= rhs;
        }
        self
    }
}

impl From<BTreeMap<Stat, f64>> for Stats {
    fn from(map: BTreeMap<Stat, f64>) -> Self {
        Stats::from_pairs(map)
    }
}

impl From<Stats> for BTreeMap<Stat, f64> {
    fn from(stats: Stats) -> Self {
        stats.iter_nonzero().collect()
    }
}

impl fmt::Debug for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter_nonzero().map(|(s, v)| (s.name(), v)))
            .finish()
    }
}

/// `modified += source * ratio`, evaluated against pre-dependency values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatDependency {
    pub source: Stat,
    pub modified: Stat,
    pub ratio: f64,
}

impl StatDependency {
    pub fn new(source: Stat, modified: Stat, ratio: f64) -> Self {
        Self {
            source,
            modified,
            ratio,
        }
    }
}

/// Apply linear dependencies. Order-independent: every dependency reads the
/// input vector, not partially updated values.
pub fn apply_dependencies(stats: &Stats, dependencies: &[StatDependency]) -> Stats {
    let mut out = *stats;
    for dep in dependencies {
        out[dep.modified] += stats[dep.source] * dep.ratio;
    }
    out
}

/// Base, bonus and final stats of one actor or target.
#[derive(Debug, Clone, Default)]
pub struct StatBlock {
    base: Stats,
    bonus: Stats,
    dependencies: Vec<StatDependency>,
    computed: Stats,
}

impl StatBlock {
    pub fn new(base: Stats, dependencies: Vec<StatDependency>) -> Self {
        let computed = apply_dependencies(&base, &dependencies);
        Self {
            base,
            bonus: Stats::new(),
            dependencies,
            computed,
        }
    }

    /// Final stats including temporary bonuses and dependencies.
    pub fn current(&self) -> &Stats {
        &self.computed
    }

    pub fn get(&self, stat: Stat) -> f64 {
        self.computed[stat]
    }

    pub fn base(&self) -> &Stats {
        &self.base
    }

    /// Add (or with negative values, remove) a temporary bonus.
    pub fn add_bonus(&mut self, delta: &Stats) {
        if delta.is_zero() {
            return;
        }
        self.bonus += *delta;
        self.recompute();
    }

    pub fn add_bonus_stat(&mut self, stat: Stat, amount: f64) {
        self.add_bonus(&Stats::new().with(stat, amount));
    }

    fn recompute(&mut self) {
        self.computed = apply_dependencies(&(self.base + self.bonus), &self.dependencies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_all_matches_indices() {
        for (i, stat) in Stat::ALL.iter().enumerate() {
            assert_eq!(stat.index(), i);
        }
    }

    #[test]
    fn test_stats_arithmetic() {
        let a = Stats::from_pairs([(Stat::SpellPower, 100.0), (Stat::Intellect, 50.0)]);
        let b = Stats::new().with(Stat::SpellPower, 20.0);
        let sum = a + b;
        assert_eq!(sum[Stat::SpellPower], 120.0);
        assert_eq!((sum - b)[Stat::SpellPower], 100.0);
        assert_eq!((a * 2.0)[Stat::Intellect], 100.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Stats::new().with(Stat::SpellHit, f64::NAN).validate().is_err());
        assert!(Stats::new().with(Stat::Armor, -1.0).validate().is_err());
        assert!(Stats::new().with(Stat::Armor, 5.0).validate().is_ok());
    }

    #[test]
    fn test_dependencies_read_input_values() {
        let base = Stats::from_pairs([(Stat::Intellect, 100.0), (Stat::SpellCrit, 10.0)]);
        let deps = [
            StatDependency::new(Stat::Intellect, Stat::SpellCrit, 0.5),
            StatDependency::new(Stat::SpellCrit, Stat::SpellPower, 1.0),
        ];
        let out = apply_dependencies(&base, &deps);
        assert_eq!(out[Stat::SpellCrit], 60.0);
        // Reads the pre-dependency crit value.
        assert_eq!(out[Stat::SpellPower], 10.0);
    }

    #[test]
    fn test_stat_block_bonus_propagates_through_dependencies() {
        let base = Stats::new().with(Stat::Intellect, 100.0);
        let mut block = StatBlock::new(base, vec![StatDependency::new(Stat::Intellect, Stat::Mana, 15.0)]);
        assert_eq!(block.get(Stat::Mana), 1500.0);

        block.add_bonus_stat(Stat::Intellect, 10.0);
        assert_eq!(block.get(Stat::Mana), 1650.0);

        block.add_bonus_stat(Stat::Intellect, -10.0);
        assert_eq!(block.get(Stat::Mana), 1500.0);
    }

    #[test]
    fn test_serde_map_roundtrip_skips_zeroes() {
        let stats = Stats::from_pairs([(Stat::SpellPower, 50.0)]);
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"spell_power":50.0}"#);
    }
}
