use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use tokio::sync::{watch, Mutex};
use tracing::info;

use crate::{
    controller::Controller,
    oracle::RulesOracle,
    provider::MoveProvider,
    server_types::{MoveRequest, ShellError, ShellResult, StartRequest},
    session::Snapshot,
};

struct AppState<O, P, R> {
    controller: Arc<Mutex<Controller<O, P, R>>>,
    // Read without the lock, so `GET /` answers while the engine thinks.
    snapshots: watch::Receiver<Snapshot>,
}

impl<O, P, R> Clone for AppState<O, P, R> {
    fn clone(&self) -> Self {
        AppState {
            controller: Arc::clone(&self.controller),
            snapshots: self.snapshots.clone(),
        }
    }
}

/// Exposes a controller over HTTP.
///
/// `GET /` returns the latest snapshot; `POST /start`, `/move`, `/confirm` and
/// `/reset` run the matching command and return the snapshot after it.
pub fn serve_session<O, P, R>(controller: Controller<O, P, R>) -> Router
where
    O: RulesOracle + 'static,
    P: MoveProvider + 'static,
    R: Rng + Send + 'static,
{
    let state = AppState {
        snapshots: controller.subscribe(),
        controller: Arc::new(Mutex::new(controller)),
    };
    Router::new()
        .route("/", get(get_snapshot))
        .route("/start", post(start))
        .route("/move", post(submit_move))
        .route("/confirm", post(confirm))
        .route("/reset", post(reset))
        .with_state(state)
}

async fn get_snapshot<O, P, R>(State(s): State<AppState<O, P, R>>) -> Json<Snapshot> {
    Json(s.snapshots.borrow().clone())
}

async fn start<O, P, R>(
    State(s): State<AppState<O, P, R>>,
    Json(request): Json<StartRequest>,
) -> ShellResult
where
    O: RulesOracle,
    P: MoveProvider,
    R: Rng + Send,
{
    let mut c = s.controller.lock().await;
    match c.start(request.difficulty).await {
        Ok(()) => ShellResult::Ok(c.snapshot()),
        Err(err) => ShellResult::Err(err),
    }
}

async fn submit_move<O, P, R>(
    State(s): State<AppState<O, P, R>>,
    Json(request): Json<MoveRequest>,
) -> ShellResult
where
    O: RulesOracle,
    P: MoveProvider,
    R: Rng + Send,
{
    let Some(hm) = request.to_human_move() else {
        return ShellResult::BadRequest(ShellError {
            kind: "bad_request".to_string(),
            message: "request does not name a board move".to_string(),
            fatal: false,
        });
    };
    let mut c = s.controller.lock().await;
    match c.submit_move(hm) {
        Ok(()) => ShellResult::Ok(c.snapshot()),
        Err(err) => ShellResult::Err(err),
    }
}

async fn confirm<O, P, R>(State(s): State<AppState<O, P, R>>) -> ShellResult
where
    O: RulesOracle,
    P: MoveProvider,
    R: Rng + Send,
{
    let mut c = s.controller.lock().await;
    match c.confirm().await {
        Ok(()) => ShellResult::Ok(c.snapshot()),
        Err(err) => ShellResult::Err(err),
    }
}

async fn reset<O, P, R>(State(s): State<AppState<O, P, R>>) -> ShellResult
where
    O: RulesOracle,
    P: MoveProvider,
    R: Rng + Send,
{
    let mut c = s.controller.lock().await;
    c.reset();
    info!("session reset over http");
    ShellResult::Ok(c.snapshot())
}
