//! dpsim - discrete-event combat simulator
//!
//! Simulates a party of actors fighting one or more targets: abilities flow
//! through a hit/crit/resist pipeline, auras modify stats and react to hits,
//! and a clock advances time between casts, swings, ticks and expirations.
//! Batches of seeded iterations are aggregated into DPS distributions and
//! stat weights.

pub mod aggregate;
pub mod aura;
pub mod combat;
pub mod core;
pub mod entity;
pub mod proc;
pub mod rotation;
pub mod simulation;
