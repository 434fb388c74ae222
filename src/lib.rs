//! A human-versus-engine chess session.
//!
//! The [`Controller`] owns the game: it holds the position, decides whose turn
//! it is, checks every move against a [`RulesOracle`] and asks a
//! [`MoveProvider`] for the automated side's replies. Shells (the terminal
//! shell in [`shell`], the HTTP shell behind the `server` feature) only send
//! commands and render [`Snapshot`]s.
//!
//! A game runs like this:
//!
//! 1. A fresh session randomly picks who moves first. The first mover plays White.
//! 2. [`Controller::start`] fixes the difficulty. If the automated side moves
//!    first, it does so right away.
//! 3. The human submits a move with [`Controller::submit_move`].
//! 4. The human confirms with [`Controller::confirm`]; only then does the
//!    automated side reply.
//! 5. Repeat 3-4 until the game ends, then [`Controller::reset`].
pub mod chess_serde;
pub mod config;
pub mod controller;
pub mod difficulty;
pub mod error;
pub mod gateway;
pub mod oracle;
pub mod provider;
#[cfg(feature = "server")]
pub mod server;
pub mod server_types;
pub mod session;
pub mod shell;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use config::Config;
pub use controller::Controller;
pub use difficulty::{Difficulty, StrengthBudget};
pub use error::{InvalidMoveError, SessionError};
pub use oracle::{GameStatus, RulesOracle, StandardRules};
pub use provider::{MoveProvider, ProviderError};
pub use session::{Coord, GameResult, HumanMove, Lifecycle, Promotion, Session, Side, Snapshot};
pub use shakmaty;

/// The controller the binaries run: standard rules, a provider picked at runtime.
pub type DefaultController = Controller<StandardRules, Box<dyn MoveProvider>, ChaCha8Rng>;

/// Builds a [`DefaultController`] from configuration.
///
/// With `engine_path` set the automated side is that UCI engine, otherwise it
/// plays random legal moves.
pub fn controller_from_config(config: &Config) -> DefaultController {
    let provider: Box<dyn MoveProvider> = match &config.engine_path {
        Some(path) => Box::new(provider::UciEngine::new(path.clone())),
        None => Box::new(match config.seed {
            Some(seed) => provider::RandomMover::new(seed),
            None => provider::RandomMover::from_entropy(),
        }),
    };
    let rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    Controller::new(StandardRules, provider, rng).with_grace(config.grace())
}
