pub mod cancel;
pub mod config;
pub mod error;
pub mod registry;
pub mod rng;
pub mod stats;
pub mod types;

pub use cancel::CancelToken;
pub use config::{Encounter, SimConfig, SimOptions};
pub use error::{Result, SimError};
pub use registry::IdRegistry;
pub use rng::RandomSource;
pub use stats::{Stat, StatBlock, StatDependency, Stats};
pub use types::{
    ActionId, ActorIndex, AuraId, CooldownId, SchoolMask, SimTime, SpellSchool, TargetIndex, Tristate,
};
