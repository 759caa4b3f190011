use thiserror::Error;

use crate::core::types::{AbilityId, SimTime, UnitId};

#[derive(Error, Debug)]
pub enum ReckoningError {
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ReckoningError>;

/// Non-fatal ability failures
///
/// Returned as values; the battle loop logs them and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbilityError {
    #[error("Ability {0} not found in registry")]
    AbilityUnavailable(AbilityId),

    #[error("Ability {id} is malformed: {reason}")]
    MalformedDefinition { id: AbilityId, reason: String },

    #[error("Ability {id} on cooldown until t={ready_at:.2} (now t={now:.2})")]
    OnCooldown {
        id: AbilityId,
        ready_at: SimTime,
        now: SimTime,
    },

    #[error("Insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        resource: String,
        required: f32,
        available: f32,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Spatial grid unavailable for {0}")]
    GridUnavailable(String),

    #[error("Target HP too high ({:.1}%, threshold {:.1}%)", .ratio * 100.0, .threshold * 100.0)]
    CaptureResisted { ratio: f32, threshold: f32 },
}
