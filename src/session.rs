use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen, uci::Uci, CastlingMode, Chess, Color, EnPassantMode, File, Move, Rank,
    Role, Square,
};

use crate::{difficulty::Difficulty, error::InvalidMoveError};

/// One of the two participants of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The person at the shell.
    Human,
    /// The side whose moves come from a [`crate::provider::MoveProvider`].
    Automated,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Human => Side::Automated,
            Side::Automated => Side::Human,
        }
    }

    /// The label the shells print for this side.
    pub fn label(self) -> &'static str {
        match self {
            Side::Human => "Player",
            Side::Automated => "AI",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a session is in its game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    NotStarted,
    AwaitingHumanMove,
    AwaitingConfirmation,
    AwaitingAutomatedMove,
    Finished,
}

/// Final outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Won(Side),
    Drawn,
}

impl GameResult {
    pub fn winner(self) -> Option<Side> {
        match self {
            GameResult::Won(side) => Some(side),
            GameResult::Drawn => None,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Won(side) => write!(f, "{side} wins!"),
            GameResult::Drawn => f.write_str("Draw"),
        }
    }
}

/// An abstract board coordinate: file 0-7 (a-h), rank 0-7 (1-8).
///
/// Shells map their own input (pixels, algebraic text) onto this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub file: u8,
    pub rank: u8,
}

impl Coord {
    pub const fn new(file: u8, rank: u8) -> Coord {
        Coord { file, rank }
    }

    /// Converts to a board square, rejecting anything off the 8x8 grid.
    pub fn to_square(self) -> Result<Square, InvalidMoveError> {
        if self.file > 7 || self.rank > 7 {
            return Err(InvalidMoveError::OffBoard {
                file: self.file,
                rank: self.rank,
            });
        }
        Ok(Square::from_coords(
            File::new(u32::from(self.file)),
            Rank::new(u32::from(self.rank)),
        ))
    }
}

impl From<Square> for Coord {
    fn from(sq: Square) -> Coord {
        Coord {
            file: sq.file() as u8,
            rank: sq.rank() as u8,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file < 8 && self.rank < 8 {
            write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
        } else {
            write!(f, "({}, {})", self.file, self.rank)
        }
    }
}

/// A move as the human enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanMove {
    pub origin: Coord,
    pub destination: Coord,
    /// Piece to promote to. Omitted promotions default to a queen.
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

impl HumanMove {
    pub fn new(origin: Coord, destination: Coord) -> HumanMove {
        HumanMove {
            origin,
            destination,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> HumanMove {
        self.promotion = Some(promotion);
        self
    }
}

/// Promotion choices for a human move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    pub fn role(self) -> Role {
        match self {
            Promotion::Queen => Role::Queen,
            Promotion::Rook => Role::Rook,
            Promotion::Bishop => Role::Bishop,
            Promotion::Knight => Role::Knight,
        }
    }

    pub fn from_char(c: char) -> Option<Promotion> {
        match c.to_ascii_lowercase() {
            'q' => Some(Promotion::Queen),
            'r' => Some(Promotion::Rook),
            'b' => Some(Promotion::Bishop),
            'n' => Some(Promotion::Knight),
            _ => None,
        }
    }
}

/// The controller's authoritative state.
///
/// The side that moves first plays White for the whole session.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) position: Chess,
    pub(crate) first_mover: Side,
    pub(crate) active_side: Side,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) difficulty: Option<Difficulty>,
    pub(crate) result: Option<GameResult>,
    pub(crate) fault: Option<String>,
    pub(crate) last_move: Option<Uci>,
    pub(crate) ply: u32,
}

impl Session {
    /// A fresh, not yet started session from the initial position.
    pub fn new(first_mover: Side) -> Session {
        Session {
            position: Chess::default(),
            first_mover,
            active_side: first_mover,
            lifecycle: Lifecycle::NotStarted,
            difficulty: None,
            result: None,
            fault: None,
            last_move: None,
            ply: 0,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn active_side(&self) -> Side {
        self.active_side
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    pub fn color_of(&self, side: Side) -> Color {
        if side == self.first_mover {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn side_of(&self, color: Color) -> Side {
        if color == Color::White {
            self.first_mover
        } else {
            self.first_mover.other()
        }
    }

    /// Installs a position produced by the gateway and records the move that led to it.
    pub(crate) fn advance(&mut self, position: Chess, played: &Move) {
        self.last_move = Some(played.to_uci(CastlingMode::Standard));
        self.position = position;
        self.ply += 1;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string(),
            active_side: self.active_side,
            lifecycle: self.lifecycle,
            difficulty: self.difficulty,
            human_color: self.color_of(Side::Human).char(),
            last_move: self.last_move.clone(),
            ply: self.ply,
            result: self.result,
            fault: self.fault.clone(),
        }
    }
}

/// Read-only view of a session, handed to shells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The position in FEN.
    pub position: String,
    pub active_side: Side,
    pub lifecycle: Lifecycle,
    pub difficulty: Option<Difficulty>,
    /// `w` or `b`.
    pub human_color: char,
    #[serde(with = "crate::chess_serde::opt_uci_serde", default)]
    pub last_move: Option<Uci>,
    pub ply: u32,
    pub result: Option<GameResult>,
    pub fault: Option<String>,
}

impl Snapshot {
    pub fn is_busy(&self) -> bool {
        self.lifecycle == Lifecycle::AwaitingAutomatedMove && self.fault.is_none()
    }
}
