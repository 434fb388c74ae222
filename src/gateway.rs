//! The single path by which moves reach a session's position.
//!
//! Every move, human or automated, is checked against the oracle's legal moves
//! for the acting side before a new position is produced. Nothing here mutates
//! the session; the controller installs the returned position.

use shakmaty::{uci::Uci, CastlingMode, Chess, Move, MoveList, Position, Role};

use crate::{
    error::InvalidMoveError,
    oracle::{GameStatus, RulesOracle},
    session::{GameResult, HumanMove, Session, Side},
};

/// Legal moves for `side` in the session's position.
pub fn legal_moves<O: RulesOracle + ?Sized>(oracle: &O, session: &Session, side: Side) -> MoveList {
    oracle.legal_moves(&session.position, session.color_of(side))
}

/// The result of the position, if the game is over.
pub fn is_terminal<O: RulesOracle + ?Sized>(oracle: &O, session: &Session) -> Option<GameResult> {
    match oracle.status(&session.position) {
        GameStatus::Ongoing => None,
        GameStatus::Won(color) => Some(GameResult::Won(session.side_of(color))),
        GameStatus::Drawn => Some(GameResult::Drawn),
    }
}

/// Produces the position after `m`, or rejects it.
///
/// Fails when `acting` is not the active side or when `m` is not among the
/// oracle's legal moves for it.
pub fn try_apply<O: RulesOracle + ?Sized>(
    oracle: &O,
    session: &Session,
    m: &Move,
    acting: Side,
) -> Result<Chess, InvalidMoveError> {
    if session.active_side != acting {
        return Err(InvalidMoveError::OutOfTurn);
    }
    if !legal_moves(oracle, session, acting).contains(m) {
        return Err(InvalidMoveError::IllegalUci(
            m.to_uci(CastlingMode::Standard).to_string(),
        ));
    }
    Ok(oracle.play(&session.position, m))
}

/// Finds the legal move a human meant by an origin/destination pair.
///
/// Castling is written as the king's two-square step (or king onto rook).
/// A missing promotion piece means a queen.
pub fn resolve_human_move<O: RulesOracle + ?Sized>(
    oracle: &O,
    session: &Session,
    hm: &HumanMove,
) -> Result<Move, InvalidMoveError> {
    let from = hm.origin.to_square()?;
    let to = hm.destination.to_square()?;
    if session.active_side != Side::Human {
        return Err(InvalidMoveError::OutOfTurn);
    }

    let own = session.color_of(Side::Human);
    match session.position.board().piece_at(from) {
        Some(piece) if piece.color == own => {}
        _ => return Err(InvalidMoveError::NotYourPiece { origin: hm.origin }),
    }

    let legal = legal_moves(oracle, session, Side::Human);
    let wanted = |promotion: Option<Role>| {
        let uci = Uci::Normal {
            from,
            to,
            promotion,
        };
        legal.iter().find(|m| {
            m.to_uci(CastlingMode::Standard) == uci || m.to_uci(CastlingMode::Chess960) == uci
        })
    };

    let found = match hm.promotion {
        Some(p) => wanted(Some(p.role())),
        None => wanted(None).or_else(|| wanted(Some(Role::Queen))),
    };
    found.cloned().ok_or(InvalidMoveError::Illegal {
        origin: hm.origin,
        destination: hm.destination,
    })
}

/// Finds the legal move for `side` that a UCI string names.
pub fn resolve_uci<O: RulesOracle + ?Sized>(
    oracle: &O,
    session: &Session,
    side: Side,
    uci: &Uci,
) -> Result<Move, InvalidMoveError> {
    legal_moves(oracle, session, side)
        .iter()
        .find(|m| {
            m.to_uci(CastlingMode::Standard) == *uci || m.to_uci(CastlingMode::Chess960) == *uci
        })
        .cloned()
        .ok_or_else(|| InvalidMoveError::IllegalUci(uci.to_string()))
}
