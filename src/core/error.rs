use thiserror::Error;

use crate::battle::execution::TurnPhase;
use crate::battle::units::UnitId;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Degenerate geometry: angle vertex coincides with a ray endpoint")]
    DegenerateGeometry,

    #[error("A turn is already executing")]
    AlreadyExecuting,

    #[error("Roster and intents are locked while the engine is {phase:?}")]
    TurnInProgress { phase: TurnPhase },

    #[error("No turn is being played back")]
    NotPlaying,

    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    #[error("Power unavailable: {0}")]
    PowerUnavailable(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticsError>;
