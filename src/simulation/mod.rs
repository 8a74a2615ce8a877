//! One simulated encounter
//!
//! A [`Simulation`] owns every mutable piece of an iteration: the clock, the
//! random source, the actors and targets with their auras, the running DoTs
//! and the per-ability metrics. Nothing in here is shared between
//! iterations; a [`Scenario`] holds the immutable inputs and builds a fresh
//! `Simulation` per seed.
//!
//! The work is split by phase:
//! - `clock`: event ordering, time advancement and the rotation loop
//! - `cast`: validating and starting casts, phantom casts, auto attacks
//! - `pipeline`: outcome and damage resolution of one effect, DoT ticks
//! - `reactions`: applying what procs and hooks queued

mod cast;
mod clock;
mod pipeline;
mod reactions;
pub mod result;
pub mod scenario;

use std::collections::BTreeMap;

use tracing::trace;

use crate::aura::AuraOwner;
use crate::combat::dot::DotState;
use crate::combat::metrics::CastMetrics;
use crate::core::error::{Result, SimError};
use crate::core::rng::RandomSource;
use crate::core::stats::Stat;
use crate::core::types::{ActionId, ActorIndex, SimTime, TargetIndex};
use crate::entity::character::Character;
use crate::entity::resources::Resources;
use crate::entity::target::Target;

pub use result::IterationResult;
pub use scenario::Scenario;

pub const ENCOUNTER_DURATION_LABEL: &str = "Encounter Duration";

pub struct Simulation {
    now: SimTime,
    duration: SimTime,
    gcd_min: SimTime,
    exit_on_oom: bool,
    seed: u64,
    rng: RandomSource,
    actors: Vec<Character>,
    targets: Vec<Target>,
    dots: Vec<DotState>,
    next_dot_serial: u64,
    metrics: BTreeMap<ActionId, CastMetrics>,
    total_damage: f64,
    log: Option<Vec<String>>,
}

impl Simulation {
    /// Fresh iteration state for `seed`. Permanent buffs and configured
    /// target debuffs are active from `t = 0`.
    pub fn new(scenario: &Scenario, seed: u64) -> Result<Self> {
        let mut rng = RandomSource::new(seed);
        let encounter = &scenario.encounter;
        let base = encounter.duration_secs;
        let variation = encounter.duration_variation_secs;
        let duration_secs = if variation > 0.0 {
            rng.uniform(ENCOUNTER_DURATION_LABEL, base - variation, base + variation)
        } else {
            base
        };
        let duration = SimTime::try_from_secs_f64(duration_secs)
            .map_err(|e| SimError::Config(format!("encounter duration {duration_secs}: {e}")))?;

        let mut actors = Vec::with_capacity(scenario.characters.len());
        for (i, config) in scenario.characters.iter().enumerate() {
            let mut actor = Character::from_config(ActorIndex(i), config);
            for aura in &config.permanent_auras {
                actor.auras.apply(&mut actor.stats, aura, SimTime::ZERO, None);
            }
            // Pools are sized after permanent buffs so mana buffs count.
            actor.resources = Resources::new(&config.resources, actor.stats.get(Stat::Mana));
            actors.push(actor);
        }

        let mut targets = Vec::with_capacity(encounter.num_targets);
        for i in 0..encounter.num_targets {
            let mut target = Target::new(TargetIndex(i), encounter);
            for (aura, stacks) in &scenario.target_auras {
                target.auras.apply(&mut target.stats, aura, SimTime::ZERO, Some(*stacks));
            }
            targets.push(target);
        }

        Ok(Self {
            now: SimTime::ZERO,
            duration,
            gcd_min: scenario.options.gcd_min(),
            exit_on_oom: scenario.options.exit_on_oom,
            seed,
            rng,
            actors,
            targets,
            dots: Vec::new(),
            next_dot_serial: 0,
            metrics: BTreeMap::new(),
            total_damage: 0.0,
            log: None,
        })
    }

    /// Keep human-readable log lines for this iteration.
    pub fn capture_log(&mut self) {
        self.log.get_or_insert_with(Vec::new);
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn duration(&self) -> SimTime {
        self.duration
    }

    pub fn remaining(&self) -> SimTime {
        self.duration.saturating_sub(self.now)
    }

    pub fn actor(&self, index: ActorIndex) -> Option<&Character> {
        self.actors.get(index.0)
    }

    pub fn actor_mut(&mut self, index: ActorIndex) -> Option<&mut Character> {
        self.actors.get_mut(index.0)
    }

    pub fn target(&self, index: TargetIndex) -> Option<&Target> {
        self.targets.get(index.0)
    }

    pub fn target_mut(&mut self, index: TargetIndex) -> Option<&mut Target> {
        self.targets.get_mut(index.0)
    }

    pub fn dots(&self) -> &[DotState] {
        &self.dots
    }

    pub fn metrics(&self, action: ActionId) -> Option<&CastMetrics> {
        self.metrics.get(&action)
    }

    pub fn total_damage(&self) -> f64 {
        self.total_damage
    }

    pub fn log_lines(&self) -> &[String] {
        self.log.as_deref().unwrap_or_default()
    }

    fn actor_ref(&self, index: ActorIndex) -> Result<&Character> {
        self.actors
            .get(index.0)
            .ok_or_else(|| SimError::Config(format!("no actor with index {}", index.0)))
    }

    fn target_exists(&self, index: TargetIndex) -> Result<()> {
        if index.0 < self.targets.len() {
            Ok(())
        } else {
            Err(SimError::Config(format!("no target with index {}", index.0)))
        }
    }

    fn owner_exists(&self, owner: AuraOwner) -> Result<()> {
        match owner {
            AuraOwner::Actor(actor) => self.actor_ref(actor).map(|_| ()),
            AuraOwner::Target(target) => self.target_exists(target),
        }
    }

    fn log_enabled(&self) -> bool {
        self.log.is_some()
    }

    fn push_log(&mut self, line: String) {
        if let Some(log) = self.log.as_mut() {
            let line = format!("[{:.2}] {}", self.now.as_secs_f64(), line);
            trace!("{line}");
            log.push(line);
        }
    }
}
