use thiserror::Error;

use crate::engine::physics::{BodyId, SourceId};

/// Error types for gravity setup and configuration
#[derive(Error, Debug)]
pub enum GravityError {
    #[error("Unknown gravity source: {0:?}")]
    UnknownSource(SourceId),

    #[error("Unknown gravity body: {0:?}")]
    UnknownBody(BodyId),

    #[error("No rigid body registered for {0:?}")]
    MissingRigidBody(BodyId),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gravity operations
pub type GravityResult<T> = Result<T, GravityError>;
