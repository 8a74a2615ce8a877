//! Validated, immutable simulation inputs
//!
//! Everything is checked here, before any iteration consumes randomness.
//! A `Scenario` is `Send + Sync` and shared by reference across worker
//! threads; each iteration builds its own [`Simulation`] from it.

use std::sync::Arc;

use tracing::debug;

use crate::aura::definition::AuraDef;
use crate::core::cancel::CancelToken;
use crate::core::config::{Encounter, SimConfig, SimOptions};
use crate::core::error::{Result, SimError};
use crate::core::registry::IdRegistry;
use crate::core::rng::derive_seed;
use crate::core::stats::Stat;
use crate::entity::config::CharacterConfig;
use crate::simulation::result::IterationResult;
use crate::simulation::Simulation;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub options: SimOptions,
    pub encounter: Encounter,
    /// The first character is the one stat weights and OOM metrics refer to.
    pub characters: Vec<CharacterConfig>,
    /// Debuff auras (with stack counts) present on every target from `t = 0`.
    pub target_auras: Vec<(Arc<AuraDef>, u32)>,
}

impl Scenario {
    pub fn new(config: SimConfig, characters: Vec<CharacterConfig>, registry: &IdRegistry) -> Result<Self> {
        config.validate()?;
        if characters.is_empty() {
            return Err(SimError::Config("a scenario needs at least one character".into()));
        }
        for character in &characters {
            character.validate()?;
        }
        let target_auras = config.encounter.debuffs.auras(registry)?;
        debug!(
            characters = characters.len(),
            targets = config.encounter.num_targets,
            debuffs = target_auras.len(),
            "scenario ready"
        );
        Ok(Self {
            options: config.options,
            encounter: config.encounter,
            characters,
            target_auras,
        })
    }

    pub fn iteration_seed(&self, index: u32) -> u64 {
        derive_seed(self.options.random_seed, u64::from(index))
    }

    /// Run iteration `index` on its derived seed. With `debug` set, the
    /// first iteration keeps its combat log.
    pub fn run_iteration(&self, index: u32, cancel: &CancelToken) -> Result<IterationResult> {
        let mut sim = Simulation::new(self, self.iteration_seed(index))?;
        if self.options.debug && index == 0 {
            sim.capture_log();
        }
        sim.run(cancel)
    }

    /// Copy with the first character's `stat` shifted by `delta`.
    pub fn with_stat_delta(&self, stat: Stat, delta: f64) -> Self {
        let mut shifted = self.clone();
        if let Some(first) = shifted.characters.first_mut() {
            *first = first.with_stat_delta(stat, delta);
        }
        shifted
    }

    pub fn with_options(mut self, options: SimOptions) -> Self {
        self.options = options;
        self
    }
}
