//! Outcome flags, roll categories, spell flags and proc masks
//!
//! Outcomes are composable flags: a crit that was partially resisted is
//! `CRIT | PARTIAL_1_4`, and "landed" is a mask rather than a category.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u16);

        impl $name {
            pub const NONE: $name = $name(0);

            pub const fn bits(self) -> u16 {
                self.0
            }

            pub const fn union(self, other: $name) -> $name {
                $name(self.0 | other.0)
            }

            /// True if any bit of `mask` is set.
            pub const fn matches(self, mask: $name) -> bool {
                self.0 & mask.0 != 0
            }

            /// True if every bit of `mask` is set.
            pub const fn contains(self, mask: $name) -> bool {
                self.0 & mask.0 == mask.0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = $name;

            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = $name;

            fn bitand(self, rhs: $name) -> $name {
                $name(self.0 & rhs.0)
            }
        }
    };
}

flag_set!(
    /// Resolved result of one action against one target.
    HitOutcome
);

impl HitOutcome {
    pub const MISS: HitOutcome = HitOutcome(1 << 0);
    pub const HIT: HitOutcome = HitOutcome(1 << 1);
    pub const DODGE: HitOutcome = HitOutcome(1 << 2);
    pub const PARRY: HitOutcome = HitOutcome(1 << 3);
    pub const BLOCK: HitOutcome = HitOutcome(1 << 4);
    pub const GLANCE: HitOutcome = HitOutcome(1 << 5);
    pub const CRIT: HitOutcome = HitOutcome(1 << 6);
    pub const PARTIAL_1_4: HitOutcome = HitOutcome(1 << 7);
    pub const PARTIAL_2_4: HitOutcome = HitOutcome(1 << 8);
    pub const PARTIAL_3_4: HitOutcome = HitOutcome(1 << 9);

    pub const PARTIAL: HitOutcome =
        HitOutcome(Self::PARTIAL_1_4.0 | Self::PARTIAL_2_4.0 | Self::PARTIAL_3_4.0);
    pub const LANDED: HitOutcome =
        HitOutcome(Self::HIT.0 | Self::CRIT.0 | Self::GLANCE.0 | Self::BLOCK.0);

    pub fn landed(self) -> bool {
        self.matches(Self::LANDED)
    }

    /// The outcome without partial-resist tags.
    pub fn base(self) -> HitOutcome {
        HitOutcome(self.0 & !Self::PARTIAL.0)
    }
}

impl fmt::Debug for HitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for HitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(HitOutcome, &str); 10] = [
            (HitOutcome::MISS, "Miss"),
            (HitOutcome::HIT, "Hit"),
            (HitOutcome::DODGE, "Dodge"),
            (HitOutcome::PARRY, "Parry"),
            (HitOutcome::BLOCK, "Block"),
            (HitOutcome::GLANCE, "Glance"),
            (HitOutcome::CRIT, "Crit"),
            (HitOutcome::PARTIAL_1_4, "(25% Resist)"),
            (HitOutcome::PARTIAL_2_4, "(50% Resist)"),
            (HitOutcome::PARTIAL_3_4, "(75% Resist)"),
        ];
        let parts: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if parts.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

flag_set!(
    /// Behaviour switches on an ability definition.
    #[derive(Debug)]
    SpellFlags
);

impl SpellFlags {
    /// Skips the hit roll; crit is still rolled if the ability can crit.
    pub const ALWAYS_HITS: SpellFlags = SpellFlags(1 << 0);
    pub const CANNOT_BE_DODGED: SpellFlags = SpellFlags(1 << 1);
    /// All-or-nothing spells never partially resist.
    pub const BINARY: SpellFlags = SpellFlags(1 << 2);
    pub const IGNORE_RESISTS: SpellFlags = SpellFlags(1 << 3);
    /// Damage-over-time ticks use the pure snapshot value.
    pub const IGNORE_MODIFIERS: SpellFlags = SpellFlags(1 << 4);
    pub const NO_COMBAT_LOG: SpellFlags = SpellFlags(1 << 5);
}

flag_set!(
    /// What kind of hit an effect is, so listeners can filter procs.
    #[derive(Debug)]
    ProcMask
);

impl ProcMask {
    pub const MELEE_MH_AUTO: ProcMask = ProcMask(1 << 0);
    pub const MELEE_OH_AUTO: ProcMask = ProcMask(1 << 1);
    pub const MELEE_MH_SPECIAL: ProcMask = ProcMask(1 << 2);
    pub const MELEE_OH_SPECIAL: ProcMask = ProcMask(1 << 3);
    pub const RANGED_AUTO: ProcMask = ProcMask(1 << 4);
    pub const RANGED_SPECIAL: ProcMask = ProcMask(1 << 5);
    pub const SPELL: ProcMask = ProcMask(1 << 6);
    pub const PERIODIC: ProcMask = ProcMask(1 << 7);

    pub const MELEE_MH: ProcMask = ProcMask(Self::MELEE_MH_AUTO.0 | Self::MELEE_MH_SPECIAL.0);
    pub const MELEE_OH: ProcMask = ProcMask(Self::MELEE_OH_AUTO.0 | Self::MELEE_OH_SPECIAL.0);
    pub const MELEE: ProcMask = ProcMask(Self::MELEE_MH.0 | Self::MELEE_OH.0);
    pub const RANGED: ProcMask = ProcMask(Self::RANGED_AUTO.0 | Self::RANGED_SPECIAL.0);
    pub const WEAPON: ProcMask = ProcMask(Self::MELEE.0 | Self::RANGED.0);
    pub const WHITE_HIT: ProcMask =
        ProcMask(Self::MELEE_MH_AUTO.0 | Self::MELEE_OH_AUTO.0 | Self::RANGED_AUTO.0);
}

/// Which hit table an ability rolls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeRollCategory {
    /// Always hits (then crit-rolled if eligible).
    None,
    /// Two rolls: hit, then crit.
    Magic,
    /// Melee auto-attack: single roll over the full table.
    White,
    /// Melee special attack: miss/dodge/parry/block roll, then a crit roll.
    Special,
    /// Ranged: miss roll, then a crit roll.
    Ranged,
}

impl OutcomeRollCategory {
    pub fn is_physical(self) -> bool {
        matches!(
            self,
            OutcomeRollCategory::White | OutcomeRollCategory::Special | OutcomeRollCategory::Ranged
        )
    }
}

/// Which crit chance a second (independent) crit roll uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritRollCategory {
    None,
    Magical,
    Physical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landed_mask() {
        assert!(HitOutcome::HIT.landed());
        assert!(HitOutcome::CRIT.landed());
        assert!(HitOutcome::GLANCE.landed());
        assert!(HitOutcome::BLOCK.landed());
        assert!(!HitOutcome::MISS.landed());
        assert!(!HitOutcome::DODGE.landed());
        assert!(!HitOutcome::PARRY.landed());
    }

    #[test]
    fn test_partial_tags_compose() {
        let outcome = HitOutcome::CRIT | HitOutcome::PARTIAL_2_4;
        assert!(outcome.landed());
        assert!(outcome.matches(HitOutcome::PARTIAL));
        assert_eq!(outcome.base(), HitOutcome::CRIT);
        assert_eq!(outcome.to_string(), "Crit (50% Resist)");
    }

    #[test]
    fn test_proc_mask_groups() {
        assert!(ProcMask::MELEE_MH_AUTO.matches(ProcMask::WHITE_HIT));
        assert!(ProcMask::MELEE_OH_SPECIAL.matches(ProcMask::MELEE_OH));
        assert!(!ProcMask::SPELL.matches(ProcMask::WEAPON));
    }

    #[test]
    fn test_physical_categories() {
        assert!(OutcomeRollCategory::White.is_physical());
        assert!(OutcomeRollCategory::Ranged.is_physical());
        assert!(!OutcomeRollCategory::Magic.is_physical());
        assert!(!OutcomeRollCategory::None.is_physical());
    }
}
