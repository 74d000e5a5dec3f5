//! The boundary to the game server.
//!
//! The wire protocol itself lives outside this crate; anything that can
//! report constants and state and accept commands can drive a team.

use thiserror::Error;

use bz_core::{Command, EnvConstants, TeamColor, WorldSnapshot};

/// Connectivity failures.  None of these are retried.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    Closed,

    #[error("server unreachable: {0}")]
    Unreachable(String),

    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A connection to the game server.
///
/// The coordinator polls state from its own thread while every agent submits
/// commands from theirs, so implementations must serialise access internally.
pub trait Protocol: Send + Sync + 'static {
    /// Per-game constants, fetched once at startup.
    fn environment_constants(&self) -> ProtocolResult<EnvConstants>;

    /// A fresh snapshot as seen by `team`.  `tick` and `elapsed` are filled
    /// in by the caller.
    fn environment_state(&self, team: TeamColor) -> ProtocolResult<WorldSnapshot>;

    fn submit_commands(&self, commands: &[Command]) -> ProtocolResult<()>;

    /// Release the connection.  Called once on shutdown.
    fn close(&self) -> ProtocolResult<()>;
}
