//! Actors and targets: stats, resources, cooldowns and equipment

pub mod character;
pub mod config;
pub mod cooldowns;
pub mod pseudo;
pub mod resources;
pub mod target;
pub mod weapons;

pub use character::{AutoAttack, Character, PendingCast};
pub use config::CharacterConfig;
pub use cooldowns::Cooldowns;
pub use pseudo::PseudoStats;
pub use resources::{ResourceConfig, ResourceCost, ResourceKind, Resources};
pub use target::{Target, TargetDefense};
pub use weapons::{AutoAttackMode, Hand, Weapon, Weapons};
