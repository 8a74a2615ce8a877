use thiserror::Error;

use crate::core::types::ActionId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ability not found: {0}")]
    MissingAbility(String),

    #[error("Invalid stat value for {stat}: {value}")]
    InvalidStat { stat: String, value: f64 },

    #[error("Invariant violated in {action}: {detail}")]
    InvariantViolation { action: ActionId, detail: String },

    #[error("Simulation aborted")]
    Aborted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl SimError {
    pub fn invariant(action: ActionId, detail: impl Into<String>) -> Self {
        SimError::InvariantViolation {
            action,
            detail: detail.into(),
        }
    }

    /// Configuration problems are reported before any randomness is consumed.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SimError::Config(_)
                | SimError::MissingAbility(_)
                | SimError::InvalidStat { .. }
                | SimError::TomlError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
