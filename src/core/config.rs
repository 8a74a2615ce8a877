//! Simulation configuration with documented defaults
//!
//! Options and encounter parameters load from TOML. Character inputs carry
//! trait objects (rotations, aura hooks) and are built in code; see
//! [`crate::entity::CharacterConfig`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aura::debuffs::TargetDebuffs;
use crate::core::error::{Result, SimError};
use crate::core::types::{secs, SimTime};
use crate::entity::target::TargetDefense;

/// Batch-level options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Number of independent iterations per batch.
    pub iterations: u32,

    /// Seed from which every iteration seed is derived.
    pub random_seed: u64,

    /// End an iteration early once every acting actor is out of mana.
    pub exit_on_oom: bool,

    /// Floor for haste-reduced global cooldowns, in seconds.
    pub gcd_min_secs: f64,

    /// Capture human-readable combat logs (first iteration only in batches).
    pub debug: bool,

    /// Worker threads. 0 uses the global rayon pool.
    pub workers: usize,

    /// Operational safeguard: abort the batch after this many seconds.
    pub wall_clock_budget_secs: Option<f64>,

    /// Width of a DPS histogram bucket.
    pub histogram_bucket: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            iterations: 1000,
            random_seed: 1,
            exit_on_oom: false,
            gcd_min_secs: 1.0,
            debug: false,
            workers: 0,
            wall_clock_budget_secs: None,
            histogram_bucket: 10.0,
        }
    }
}

impl SimOptions {
    pub fn gcd_min(&self) -> SimTime {
        secs(self.gcd_min_secs)
    }

    pub fn wall_clock_budget(&self) -> Option<Duration> {
        self.wall_clock_budget_secs.map(Duration::from_secs_f64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SimError::Config("iterations must be at least 1".into()));
        }
        if !(self.gcd_min_secs >= 0.0 && self.gcd_min_secs <= 1.5) {
            return Err(SimError::Config(format!(
                "gcd_min_secs ({}) must be within [0, 1.5]",
                self.gcd_min_secs
            )));
        }
        if !(self.histogram_bucket > 0.0) {
            return Err(SimError::Config("histogram_bucket must be positive".into()));
        }
        if let Some(budget) = self.wall_clock_budget_secs {
            if !(budget > 0.0) || !budget.is_finite() {
                return Err(SimError::Config("wall_clock_budget_secs must be positive".into()));
            }
        }
        Ok(())
    }
}

/// Fight parameters shared by every iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Encounter {
    /// Nominal fight length in seconds.
    pub duration_secs: f64,

    /// Each iteration draws its length uniformly from `duration ± variation`.
    pub duration_variation_secs: f64,

    /// Number of targets (AOE fights use more than one).
    pub num_targets: usize,

    /// Armor of every target before debuffs.
    pub target_armor: f64,

    /// Target level. Bosses are 73 (skull) in a level-70 encounter.
    pub target_level: u32,

    /// Parry, block and block value of every target.
    pub target_defense: TargetDefense,

    /// Raid debuffs applied to every target.
    pub debuffs: TargetDebuffs,
}

impl Default for Encounter {
    fn default() -> Self {
        Self {
            duration_secs: 180.0,
            duration_variation_secs: 0.0,
            num_targets: 1,
            target_armor: 7684.0,
            target_level: 73,
            target_defense: TargetDefense::default(),
            debuffs: TargetDebuffs::default(),
        }
    }
}

impl Encounter {
    pub fn duration(&self) -> SimTime {
        secs(self.duration_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.duration_secs > 0.0) || !self.duration_secs.is_finite() {
            return Err(SimError::Config(format!(
                "duration_secs ({}) must be positive",
                self.duration_secs
            )));
        }
        if !(self.duration_variation_secs >= 0.0)
            || self.duration_variation_secs >= self.duration_secs
        {
            return Err(SimError::Config(
                "duration_variation_secs must be within [0, duration_secs)".into(),
            ));
        }
        if self.num_targets == 0 {
            return Err(SimError::Config("num_targets must be at least 1".into()));
        }
        if !(self.target_armor >= 0.0) || !self.target_armor.is_finite() {
            return Err(SimError::Config("target_armor must be non-negative".into()));
        }
        if !(70..=73).contains(&self.target_level) {
            return Err(SimError::Config(format!(
                "target_level ({}) must be within 70..=73",
                self.target_level
            )));
        }
        self.target_defense.validate()?;
        self.debuffs.validate()
    }
}

/// Options plus encounter, as loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub options: SimOptions,
    pub encounter: Encounter,
}

impl SimConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;
        self.encounter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Tristate;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            [options]
            iterations = 250
            random_seed = 99

            [encounter]
            duration_secs = 120.0
            num_targets = 3

            [encounter.debuffs]
            misery = true
            curse_of_elements = "improved"
            "#,
        )
        .unwrap();

        assert_eq!(config.options.iterations, 250);
        assert_eq!(config.options.random_seed, 99);
        assert_eq!(config.encounter.num_targets, 3);
        assert_eq!(config.encounter.target_level, 73);
        assert!(config.encounter.debuffs.misery);
        assert_eq!(config.encounter.debuffs.curse_of_elements, Tristate::Improved);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = SimConfig::from_toml_str("[options]\niterations = 0\n").unwrap_err();
        assert!(err.is_config());

        let err = SimConfig::from_toml_str("[encounter]\nduration_secs = -5.0\n").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = SimConfig::from_toml_str("[options\niterations = 1").unwrap_err();
        assert!(matches!(err, SimError::TomlError(_)));
    }
}
