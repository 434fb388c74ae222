//! Sources of moves for the automated side.

mod random;
mod scripted;
mod uci;

use async_trait::async_trait;
use shakmaty::{uci::Uci, Chess};
use thiserror::Error;

pub use random::RandomMover;
pub use scripted::ScriptedProvider;
pub use uci::UciEngine;

use crate::difficulty::StrengthBudget;

/// Something that picks the automated side's moves.
///
/// A provider is handed the current position and the effort it may spend, and
/// answers with one move in UCI notation. The controller never trusts the
/// answer: it is looked up among the legal moves before it is played, and a
/// move that is not there ends the session.
///
/// Providers need not honour the budget exactly. The controller puts its own
/// deadline on every call.
#[async_trait]
pub trait MoveProvider: Send {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Choose a move for the side to move in `position`.
    async fn choose_move(
        &mut self,
        position: &Chess,
        budget: StrengthBudget,
    ) -> Result<Uci, ProviderError>;
}

#[async_trait]
impl MoveProvider for Box<dyn MoveProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn choose_move(
        &mut self,
        position: &Chess,
        budget: StrengthBudget,
    ) -> Result<Uci, ProviderError> {
        (**self).choose_move(position, budget).await
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not be reached or started.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered without a move.
    #[error("provider returned no move")]
    NoMove,

    /// The provider said something that could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("i/o error talking to provider: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        ProviderError::Io(e.to_string())
    }
}
