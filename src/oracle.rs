//! The rules of the game, kept behind a trait so the controller never embeds them.

use shakmaty::{Chess, Color, Move, MoveList, Outcome, Position};

/// Whether a position is still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Won(Color),
    Drawn,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// Answers legality and game-end questions about positions.
pub trait RulesOracle: Send + Sync {
    /// All legal moves for `color`. Empty when `color` is not the side to move.
    fn legal_moves(&self, position: &Chess, color: Color) -> MoveList;

    fn status(&self, position: &Chess) -> GameStatus;

    /// Plays a move already known to be legal.
    fn play(&self, position: &Chess, m: &Move) -> Chess {
        let mut next = position.clone();
        next.play_unchecked(m);
        next
    }
}

/// Standard chess, as implemented by shakmaty.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

/// Half-moves without capture or pawn move after which the game is drawn outright.
const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;

impl RulesOracle for StandardRules {
    fn legal_moves(&self, position: &Chess, color: Color) -> MoveList {
        if position.turn() != color {
            return MoveList::new();
        }
        position.legal_moves()
    }

    fn status(&self, position: &Chess) -> GameStatus {
        match position.outcome() {
            Some(Outcome::Decisive { winner }) => GameStatus::Won(winner),
            Some(Outcome::Draw) => GameStatus::Drawn,
            None if position.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES => GameStatus::Drawn,
            None => GameStatus::Ongoing,
        }
    }
}
