//! Core type definitions used throughout the codebase

use std::fmt;
use std::time::Duration;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Simulated time since the start of an encounter.
pub type SimTime = Duration;

/// Sentinel for "never expires" / "never ready".
pub const NEVER: SimTime = Duration::MAX;

/// Identity of an action for logging and metrics.
///
/// Exactly one of the fields is normally non-zero; `tag` distinguishes
/// variants of the same spell (e.g. main-hand vs off-hand swings).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActionId {
    #[serde(default)]
    pub spell_id: i32,
    #[serde(default)]
    pub item_id: i32,
    #[serde(default)]
    pub other_id: i32,
    #[serde(default)]
    pub tag: i32,
}

impl ActionId {
    pub const fn spell(spell_id: i32) -> Self {
        Self { spell_id, item_id: 0, other_id: 0, tag: 0 }
    }

    pub const fn item(item_id: i32) -> Self {
        Self { spell_id: 0, item_id, other_id: 0, tag: 0 }
    }

    pub const fn other(other_id: i32) -> Self {
        Self { spell_id: 0, item_id: 0, other_id, tag: 0 }
    }

    pub const fn with_tag(self, tag: i32) -> Self {
        Self { tag, ..self }
    }

    /// Stable string key used in serialized metric maps.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.spell_id != 0 {
            write!(f, "spell:{}", self.spell_id)?;
        } else if self.item_id != 0 {
            write!(f, "item:{}", self.item_id)?;
        } else {
            write!(f, "other:{}", self.other_id)?;
        }
        if self.tag != 0 {
            write!(f, "#{}", self.tag)?;
        }
        Ok(())
    }
}

/// Identifier of an aura definition, allocated once by an [`IdRegistry`].
///
/// [`IdRegistry`]: crate::core::registry::IdRegistry
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "aura#{}", _0)]
pub struct AuraId(pub u32);

/// Identifier of a cooldown timer. Several abilities may share one.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "cd#{}", _0)]
pub struct CooldownId(pub u32);

impl CooldownId {
    /// The global cooldown. Reserved; registries never hand it out.
    pub const GCD: CooldownId = CooldownId(0);
}

/// Index of an actor (player, pet) inside a simulation.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display(fmt = "actor{}", _0)]
pub struct ActorIndex(pub usize);

/// Index of a target (boss / add) inside a simulation.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[display(fmt = "target{}", _0)]
pub struct TargetIndex(pub usize);

impl TargetIndex {
    pub const PRIMARY: TargetIndex = TargetIndex(0);
}

/// Magic school (or physical) of an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpellSchool {
    Physical,
    Arcane,
    Fire,
    Frost,
    Holy,
    Nature,
    Shadow,
}

impl SpellSchool {
    pub const COUNT: usize = 7;

    pub const ALL: [SpellSchool; Self::COUNT] = [
        SpellSchool::Physical,
        SpellSchool::Arcane,
        SpellSchool::Fire,
        SpellSchool::Frost,
        SpellSchool::Holy,
        SpellSchool::Nature,
        SpellSchool::Shadow,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_physical(self) -> bool {
        matches!(self, SpellSchool::Physical)
    }
}

/// Set of spell schools, used by school-filtered modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolMask(u8);

impl SchoolMask {
    pub const NONE: SchoolMask = SchoolMask(0);
    pub const ALL: SchoolMask = SchoolMask(0b111_1111);
    /// Every school except physical.
    pub const MAGIC: SchoolMask = SchoolMask(0b111_1110);

    pub const fn of(school: SpellSchool) -> SchoolMask {
        SchoolMask(1 << school.index())
    }

    pub fn from_schools(schools: &[SpellSchool]) -> SchoolMask {
        schools.iter().fold(SchoolMask::NONE, |mask, s| mask.with(*s))
    }

    pub const fn with(self, school: SpellSchool) -> SchoolMask {
        SchoolMask(self.0 | (1 << school.index()))
    }

    pub const fn without(self, school: SpellSchool) -> SchoolMask {
        SchoolMask(self.0 & !(1 << school.index()))
    }

    pub const fn contains(self, school: SpellSchool) -> bool {
        self.0 & (1 << school.index()) != 0
    }
}

/// Two-level-plus-absent effect strength used by debuff configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    #[default]
    Missing,
    Regular,
    Improved,
}

impl Tristate {
    pub fn is_present(self) -> bool {
        self != Tristate::Missing
    }
}

/// Convert seconds (as used in config files) into simulated time.
///
/// Negative and NaN inputs clamp to zero; values too large to represent
/// saturate at [`NEVER`].
pub fn secs(value: f64) -> SimTime {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(NEVER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_id_display() {
        assert_eq!(ActionId::spell(27074).to_string(), "spell:27074");
        assert_eq!(ActionId::item(28767).to_string(), "item:28767");
        assert_eq!(ActionId::other(1).with_tag(2).to_string(), "other:1#2");
    }

    #[test]
    fn test_action_id_ordering_is_stable() {
        let mut ids = vec![ActionId::spell(5), ActionId::item(1), ActionId::spell(2)];
        ids.sort();
        assert_eq!(ids[0], ActionId::item(1));
        assert_eq!(ids[2], ActionId::spell(5));
    }

    #[test]
    fn test_school_indices_are_dense() {
        for (i, school) in SpellSchool::ALL.iter().enumerate() {
            assert_eq!(school.index(), i);
        }
    }

    #[test]
    fn test_school_mask() {
        let mask = SchoolMask::MAGIC.without(SpellSchool::Nature).without(SpellSchool::Holy);
        assert!(mask.contains(SpellSchool::Shadow));
        assert!(!mask.contains(SpellSchool::Nature));
        assert!(!mask.contains(SpellSchool::Physical));
        assert!(SchoolMask::ALL.contains(SpellSchool::Physical));
        assert_eq!(
            SchoolMask::from_schools(&[SpellSchool::Fire, SpellSchool::Frost]),
            SchoolMask::of(SpellSchool::Fire).with(SpellSchool::Frost)
        );
    }

    #[test]
    fn test_secs_clamps() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
        assert_eq!(secs(f64::INFINITY), NEVER);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(AuraId(3).to_string(), "aura#3");
        assert_eq!(CooldownId::GCD.to_string(), "cd#0");
    }
}
