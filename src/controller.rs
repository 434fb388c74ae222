//! The turn controller: owns a [`Session`] and moves it through its lifecycle.
//!
//! ```text
//! NotStarted --start--> AwaitingHumanMove | (automated move) --> AwaitingHumanMove
//! AwaitingHumanMove --submit_move--> AwaitingConfirmation
//! AwaitingConfirmation --confirm--> AwaitingAutomatedMove --reply--> AwaitingHumanMove
//! any move that ends the game --> Finished --reset--> NotStarted
//! ```
//!
//! Every command takes `&mut self`, so commands are processed one at a time.
//! Observers that cannot wait for a command to finish follow the snapshots
//! published through [`Controller::subscribe`].

use std::time::Duration;

use rand::Rng;
use shakmaty::{Chess, Move, MoveList};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    difficulty::Difficulty,
    error::{Result, SessionError},
    gateway,
    oracle::RulesOracle,
    provider::MoveProvider,
    session::{Coord, GameResult, HumanMove, Lifecycle, Session, Side, Snapshot},
};

/// Extra time a provider gets on top of its think time before it is given up on.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

pub struct Controller<O, P, R> {
    oracle: O,
    provider: P,
    rng: R,
    grace: Duration,
    session: Session,
    updates: watch::Sender<Snapshot>,
}

fn draw_first_mover<R: Rng>(rng: &mut R) -> Side {
    if rng.gen::<bool>() {
        Side::Automated
    } else {
        Side::Human
    }
}

impl<O, P, R> Controller<O, P, R>
where
    O: RulesOracle,
    P: MoveProvider,
    R: Rng + Send,
{
    /// A controller holding a fresh session. The first mover is drawn from `rng`.
    pub fn new(oracle: O, provider: P, mut rng: R) -> Self {
        let session = Session::new(draw_first_mover(&mut rng));
        let (updates, _) = watch::channel(session.snapshot());
        Controller {
            oracle,
            provider,
            rng,
            grace: DEFAULT_GRACE,
            session,
            updates,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    /// The moves the human could make right now.
    pub fn human_moves(&self) -> MoveList {
        gateway::legal_moves(&self.oracle, &self.session, Side::Human)
    }

    /// Fixes the difficulty and begins play.
    ///
    /// When the automated side moves first, its move is made before this returns.
    #[instrument(skip(self))]
    pub async fn start(&mut self, difficulty: Difficulty) -> Result<()> {
        self.ensure_healthy()?;
        if self.session.lifecycle != Lifecycle::NotStarted {
            warn!("start requested on a running session");
            return Err(SessionError::AlreadyStarted);
        }
        self.session.difficulty = Some(difficulty);
        info!(%difficulty, first = %self.session.active_side, "game started");

        match self.session.active_side {
            Side::Human => {
                self.session.lifecycle = Lifecycle::AwaitingHumanMove;
                self.publish();
                Ok(())
            }
            Side::Automated => self.automated_turn().await,
        }
    }

    /// Plays a human move given as two board coordinates.
    pub fn submit_human_move(&mut self, origin: Coord, destination: Coord) -> Result<()> {
        self.submit_move(HumanMove::new(origin, destination))
    }

    /// Plays a human move. On success the session waits for [`Controller::confirm`].
    #[instrument(skip(self), fields(origin = %hm.origin, destination = %hm.destination))]
    pub fn submit_move(&mut self, hm: HumanMove) -> Result<()> {
        self.ensure_healthy()?;
        match self.session.lifecycle {
            Lifecycle::NotStarted => return Err(SessionError::NotStarted),
            Lifecycle::Finished => {
                return Err(SessionError::WrongPhase {
                    action: "submit a move",
                    lifecycle: Lifecycle::Finished,
                })
            }
            _ => {}
        }

        let attempt = gateway::resolve_human_move(&self.oracle, &self.session, &hm)
            .and_then(|m| {
                gateway::try_apply(&self.oracle, &self.session, &m, Side::Human)
                    .map(|next| (m, next))
            });
        let (m, next) = match attempt {
            Ok(ok) => ok,
            Err(why) => {
                debug!(%why, "move rejected");
                return Err(why.into());
            }
        };

        if !self.install(next, &m, Side::Human) {
            self.session.lifecycle = Lifecycle::AwaitingConfirmation;
            debug!("waiting for confirmation before the automated reply");
        }
        self.publish();
        Ok(())
    }

    /// Lets the automated side reply to the human's last move.
    #[instrument(skip(self))]
    pub async fn confirm(&mut self) -> Result<()> {
        self.ensure_healthy()?;
        match self.session.lifecycle {
            Lifecycle::AwaitingConfirmation => {}
            Lifecycle::NotStarted => return Err(SessionError::NotStarted),
            lifecycle => {
                return Err(SessionError::WrongPhase {
                    action: "confirm",
                    lifecycle,
                })
            }
        }
        info!("move confirmed");
        self.automated_turn().await
    }

    /// Throws the session away and starts over with a newly drawn first mover.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.session = Session::new(draw_first_mover(&mut self.rng));
        info!(first = %self.session.active_side, "game reset");
        self.publish();
    }

    fn ensure_healthy(&self) -> Result<()> {
        match &self.session.fault {
            Some(fault) => Err(SessionError::Faulted(fault.clone())),
            None => Ok(()),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.snapshot());
    }

    /// Records a fatal error. The lifecycle is left where the failure happened.
    fn fail(&mut self, err: SessionError) -> SessionError {
        error!(%err, lifecycle = ?self.session.lifecycle, "session faulted");
        self.session.fault = Some(err.to_string());
        self.publish();
        err
    }

    /// Installs a validated position. Returns whether the game is now over.
    fn install(&mut self, next: Chess, m: &Move, acting: Side) -> bool {
        self.session.advance(next, m);
        info!(side = %acting, played = ?self.session.last_move.as_ref().map(ToString::to_string), "move played");

        match gateway::is_terminal(&self.oracle, &self.session) {
            Some(result) => {
                self.finish(result);
                true
            }
            None => {
                self.session.active_side = acting.other();
                false
            }
        }
    }

    fn finish(&mut self, result: GameResult) {
        self.session.result = Some(result);
        self.session.lifecycle = Lifecycle::Finished;
        info!(%result, "game over");
    }

    async fn automated_turn(&mut self) -> Result<()> {
        let difficulty = self.session.difficulty.ok_or(SessionError::NotStarted)?;
        self.session.lifecycle = Lifecycle::AwaitingAutomatedMove;
        self.publish();

        let budget = difficulty.budget();
        let deadline = budget.movetime + self.grace;
        let position = self.session.position.clone();
        debug!(provider = self.provider.name(), ?deadline, "asking for a move");

        let answer =
            tokio::time::timeout(deadline, self.provider.choose_move(&position, budget)).await;
        let uci = match answer {
            Err(_) => return Err(self.fail(SessionError::ProviderTimeout(deadline))),
            Ok(Err(why)) => return Err(self.fail(SessionError::ProviderUnavailable(why))),
            Ok(Ok(uci)) => uci,
        };

        let applied = gateway::resolve_uci(&self.oracle, &self.session, Side::Automated, &uci)
            .and_then(|m| {
                gateway::try_apply(&self.oracle, &self.session, &m, Side::Automated)
                    .map(|next| (m, next))
            });
        let (m, next) = match applied {
            Ok(ok) => ok,
            Err(why) => {
                let detail = format!("provider {} chose {uci}: {why}", self.provider.name());
                return Err(self.fail(SessionError::OracleInconsistency(detail)));
            }
        };

        if !self.install(next, &m, Side::Automated) {
            self.session.lifecycle = Lifecycle::AwaitingHumanMove;
        }
        self.publish();
        Ok(())
    }
}
