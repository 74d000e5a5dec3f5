use thiserror::Error;

use bz_core::UnitId;
use bz_field::FieldError;

use crate::ProtocolError;

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("protocol failure: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Planner(#[from] FieldError),

    #[error("team configuration error: {0}")]
    Config(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("worker for {0} panicked")]
    AgentPanicked(UnitId),
}

pub type TeamResult<T> = Result<T, TeamError>;
