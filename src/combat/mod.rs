//! Combat math: abilities, attack tables, outcomes and damage resolution

pub mod ability;
pub mod armor;
pub mod cast;
pub mod constants;
pub mod dot;
pub mod effect;
pub mod metrics;
pub mod outcome;
pub mod resolution;

pub use ability::{
    AbilityBehavior, AbilityDef, AbilityKind, AuraApplication, CooldownSpec, DamageInput,
    DamageSpec, DirectDamage, DotSpec, PeriodicDamage, ResolvedEffect, ResourceRestore,
    TargetSelection, WeaponStrike,
};
pub use armor::armor_damage_reduction;
pub use cast::{CastAttempt, RejectReason};
pub use dot::{DotPhase, DotSnapshot, DotState};
pub use effect::{Effect, EffectModifiers, HitContext, HitEvent};
pub use metrics::CastMetrics;
pub use outcome::{CritRollCategory, HitOutcome, OutcomeRollCategory, ProcMask, SpellFlags};
pub use resolution::AttackTable;
