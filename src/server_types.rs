//! Wire types of the HTTP shell.
#[cfg(feature = "server")]
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use shakmaty::uci::Uci;

use crate::{
    difficulty::Difficulty,
    error::SessionError,
    session::{Coord, HumanMove, Promotion, Snapshot},
};

/// Body of `POST /start`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct StartRequest {
    pub difficulty: Difficulty,
}

/// Body of `POST /move`: either explicit coordinates or a UCI string.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MoveRequest {
    Coords(HumanMove),
    Uci {
        #[serde(with = "crate::chess_serde::uci_serde")]
        uci: Uci,
    },
}

impl MoveRequest {
    /// The human move this request describes, if it names one at all.
    pub fn to_human_move(&self) -> Option<HumanMove> {
        match self {
            MoveRequest::Coords(hm) => Some(*hm),
            MoveRequest::Uci {
                uci: Uci::Normal {
                    from,
                    to,
                    promotion,
                },
            } => {
                let hm = HumanMove::new(Coord::from(*from), Coord::from(*to));
                Some(match promotion.and_then(|r| Promotion::from_char(r.char())) {
                    Some(p) => hm.with_promotion(p),
                    None => hm,
                })
            }
            MoveRequest::Uci { .. } => None,
        }
    }
}

/// Error body. `fatal` errors can only be cleared with `POST /reset`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShellError {
    pub kind: String,
    pub message: String,
    pub fatal: bool,
}

impl From<&SessionError> for ShellError {
    fn from(err: &SessionError) -> Self {
        ShellError {
            kind: err.kind().to_string(),
            message: err.to_string(),
            fatal: err.is_fatal(),
        }
    }
}

/// What every HTTP shell command answers with.
#[derive(Debug, Clone)]
pub enum ShellResult {
    Ok(Snapshot),
    BadRequest(ShellError),
    Err(SessionError),
}

#[cfg(feature = "server")]
impl IntoResponse for ShellResult {
    fn into_response(self) -> axum::response::Response {
        match self {
            ShellResult::Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
            ShellResult::BadRequest(what) => (StatusCode::BAD_REQUEST, Json(what)).into_response(),
            ShellResult::Err(err) => {
                let status = match &err {
                    SessionError::InvalidMove(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    SessionError::NotStarted
                    | SessionError::AlreadyStarted
                    | SessionError::WrongPhase { .. }
                    | SessionError::Faulted(_) => StatusCode::CONFLICT,
                    SessionError::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    SessionError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
                    SessionError::OracleInconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, Json(ShellError::from(&err))).into_response()
            }
        }
    }
}
