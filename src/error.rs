use std::time::Duration;

use thiserror::Error;

use crate::{
    provider::ProviderError,
    session::{Coord, Lifecycle},
};

/// Why a proposed move was turned down.
///
/// Rejections never change the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidMoveError {
    #[error("it is not this side's turn")]
    OutOfTurn,

    #[error("square ({file}, {rank}) is off the board")]
    OffBoard { file: u8, rank: u8 },

    #[error("no piece of the moving side on {origin}")]
    NotYourPiece { origin: Coord },

    #[error("{origin} to {destination} is not a legal move")]
    Illegal { origin: Coord, destination: Coord },

    #[error("move {0} is not legal in this position")]
    IllegalUci(String),
}

/// Everything a controller command can fail with.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("invalid move: {0}")]
    InvalidMove(#[from] InvalidMoveError),

    #[error("the game has not been started")]
    NotStarted,

    #[error("the game has already been started")]
    AlreadyStarted,

    #[error("cannot {action} while {lifecycle:?}")]
    WrongPhase {
        action: &'static str,
        lifecycle: Lifecycle,
    },

    #[error("the move provider is unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),

    #[error("the move provider did not answer within {0:?}")]
    ProviderTimeout(Duration),

    #[error("rules oracle disagrees with the controller: {0}")]
    OracleInconsistency(String),

    #[error("session is faulted ({0}); reset to continue")]
    Faulted(String),
}

impl SessionError {
    /// Fatal errors leave the session unusable until `reset`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::ProviderUnavailable(_)
                | SessionError::ProviderTimeout(_)
                | SessionError::OracleInconsistency(_)
                | SessionError::Faulted(_)
        )
    }

    /// Short machine-readable name, used by the shells.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::InvalidMove(_) => "invalid_move",
            SessionError::NotStarted => "not_started",
            SessionError::AlreadyStarted => "already_started",
            SessionError::WrongPhase { .. } => "wrong_phase",
            SessionError::ProviderUnavailable(_) => "provider_unavailable",
            SessionError::ProviderTimeout(_) => "provider_timeout",
            SessionError::OracleInconsistency(_) => "oracle_inconsistency",
            SessionError::Faulted(_) => "faulted",
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
