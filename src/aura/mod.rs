//! Auras: timed or permanent modifiers attached to an actor or a target

pub mod debuffs;
pub mod definition;
pub mod hooks;
pub mod modifiers;
pub mod set;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::{ActorIndex, TargetIndex};

pub use debuffs::TargetDebuffs;
pub use definition::{AuraDef, ModScope, MultiplierMod};
pub use hooks::{ActiveHook, AuraHooks, CastTiming};
pub use modifiers::{CastTimeReduction, SchoolCritBonus, SchoolDamageBonus, SchoolHitBonus};
pub use set::{AuraHandle, AuraSet, AuraState, StackChange};

/// Whose aura set an aura lives in.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuraOwner {
    #[display(fmt = "{}", _0)]
    Actor(ActorIndex),
    #[display(fmt = "{}", _0)]
    Target(TargetIndex),
}
