//! End-to-end runs of the turn controller against scripted providers.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use chess_session::{
    provider::{ProviderError, ScriptedProvider},
    shakmaty::{uci::Uci, Chess, Square},
    Controller, Coord, Difficulty, GameResult, InvalidMoveError, Lifecycle, MoveProvider,
    SessionError, Side, StandardRules, StrengthBudget,
};
use rand::{rngs::mock::StepRng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use similar_asserts::assert_eq;

fn human_first() -> StepRng {
    StepRng::new(0, 0)
}

fn automated_first() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

fn sq(name: &str) -> Coord {
    Coord::from(Square::from_str(name).unwrap())
}

fn scripted(moves: &[&str]) -> ScriptedProvider {
    ScriptedProvider::parse(moves.iter().copied()).unwrap()
}

/// Never answers within any sane budget.
struct Stalled {
    calls: usize,
}

#[async_trait]
impl MoveProvider for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn choose_move(
        &mut self,
        _position: &Chess,
        _budget: StrengthBudget,
    ) -> Result<Uci, ProviderError> {
        self.calls += 1;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ProviderError::NoMove)
    }
}

#[tokio::test]
async fn human_moves_then_confirms_then_ai_replies() {
    let mut c = Controller::new(StandardRules, scripted(&["e7e5"]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    assert_eq!(c.snapshot().lifecycle, Lifecycle::AwaitingHumanMove);
    assert_eq!(c.snapshot().active_side, Side::Human);

    c.submit_human_move(sq("e2"), sq("e4")).unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::AwaitingConfirmation);
    assert_eq!(snap.active_side, Side::Automated);
    assert_eq!(c.provider().calls(), 0);

    c.confirm().await.unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::AwaitingHumanMove);
    assert_eq!(snap.active_side, Side::Human);
    assert_eq!(
        snap.position,
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );
    assert_eq!(c.provider().budgets()[0], Difficulty::Easy.budget());
}

#[tokio::test]
async fn automated_first_mover_plays_without_confirmation() {
    let mut c = Controller::new(StandardRules, scripted(&["d2d4"]), automated_first());
    assert_eq!(c.snapshot().active_side, Side::Automated);
    assert_eq!(c.snapshot().human_color, 'b');

    c.start(Difficulty::Hard).await.unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::AwaitingHumanMove);
    assert_eq!(snap.active_side, Side::Human);
    assert_eq!(snap.ply, 1);
    assert_eq!(c.provider().budgets()[0].movetime, Duration::from_secs(3));

    c.submit_human_move(sq("d7"), sq("d5")).unwrap();
    assert_eq!(c.snapshot().lifecycle, Lifecycle::AwaitingConfirmation);
}

#[tokio::test]
async fn foreign_or_empty_origin_is_rejected_without_change() {
    let mut c = Controller::new(StandardRules, scripted(&[]), human_first());
    c.start(Difficulty::Medium).await.unwrap();
    let before = c.snapshot();

    for (from, to) in [("e7", "e5"), ("e4", "e5"), ("e2", "e5")] {
        let err = c.submit_human_move(sq(from), sq(to)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidMove(_)), "{from}{to}: {err}");
        assert_eq!(c.snapshot(), before);
    }
}

#[tokio::test]
async fn moving_while_the_ai_is_to_move_is_out_of_turn() {
    let mut c = Controller::new(StandardRules, scripted(&["e7e5"]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("e2"), sq("e4")).unwrap();
    let before = c.snapshot();

    let err = c.submit_human_move(sq("d2"), sq("d4")).unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidMove(InvalidMoveError::OutOfTurn)
    ));
    assert_eq!(c.snapshot(), before);
}

#[tokio::test]
async fn fools_mate_finishes_with_the_ai_as_winner() {
    let mut c = Controller::new(StandardRules, scripted(&["e7e5", "d8h4"]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("f2"), sq("f3")).unwrap();
    c.confirm().await.unwrap();
    c.submit_human_move(sq("g2"), sq("g4")).unwrap();
    c.confirm().await.unwrap();

    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::Finished);
    assert_eq!(snap.result, Some(GameResult::Won(Side::Automated)));
    assert_eq!(snap.result.map(|r| r.to_string()), Some("AI wins!".to_string()));

    let err = c.submit_human_move(sq("a2"), sq("a3")).unwrap_err();
    assert!(matches!(
        err,
        SessionError::WrongPhase {
            lifecycle: Lifecycle::Finished,
            ..
        }
    ));
    assert!(matches!(
        c.confirm().await,
        Err(SessionError::WrongPhase { .. })
    ));
}

#[tokio::test]
async fn human_mate_skips_the_confirmation_gate() {
    // The AI plays Black into the fool's mate pattern mirrored: 1.e4 f6 2.d4 g5 3.Qh5#
    let mut c = Controller::new(StandardRules, scripted(&["f7f6", "g7g5"]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("e2"), sq("e4")).unwrap();
    c.confirm().await.unwrap();
    c.submit_human_move(sq("d2"), sq("d4")).unwrap();
    c.confirm().await.unwrap();
    c.submit_human_move(sq("d1"), sq("h5")).unwrap();

    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::Finished);
    assert_eq!(snap.result, Some(GameResult::Won(Side::Human)));
    // No flip after the final move.
    assert_eq!(snap.active_side, Side::Human);
    assert_eq!(c.provider().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn a_stalled_provider_times_out_once() {
    let mut c = Controller::new(StandardRules, Stalled { calls: 0 }, human_first())
        .with_grace(Duration::from_millis(500));
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("e2"), sq("e4")).unwrap();
    let before = c.snapshot();

    let err = c.confirm().await.unwrap_err();
    assert!(matches!(err, SessionError::ProviderTimeout(d) if d == Duration::from_millis(1500)));
    assert!(err.is_fatal());

    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::AwaitingAutomatedMove);
    assert_eq!(snap.position, before.position);
    assert_eq!(snap.ply, before.ply);
    assert!(snap.fault.is_some());
    assert!(!snap.is_busy());

    // Neither command retries the provider.
    assert!(matches!(c.confirm().await, Err(SessionError::Faulted(_))));
    assert!(matches!(
        c.submit_human_move(sq("d2"), sq("d4")),
        Err(SessionError::Faulted(_))
    ));
    assert_eq!(c.provider().calls, 1);

    c.reset();
    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::NotStarted);
    assert_eq!(snap.fault, None);
}

#[tokio::test]
async fn provider_without_a_move_is_fatal() {
    let mut c = Controller::new(StandardRules, scripted(&[]), automated_first());
    let err = c.start(Difficulty::Medium).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::ProviderUnavailable(ProviderError::NoMove)
    ));
    assert_eq!(c.snapshot().ply, 0);
    assert!(matches!(
        c.start(Difficulty::Easy).await,
        Err(SessionError::Faulted(_))
    ));
}

#[tokio::test]
async fn illegal_provider_move_is_an_oracle_inconsistency() {
    // e2e4 is White's move; the AI plays Black here.
    let mut c = Controller::new(StandardRules, scripted(&["e2e4"]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("g1"), sq("f3")).unwrap();
    let err = c.confirm().await.unwrap_err();
    assert!(matches!(err, SessionError::OracleInconsistency(_)));
    assert_eq!(c.snapshot().ply, 1);
}

#[tokio::test]
async fn starting_twice_keeps_the_first_difficulty() {
    let mut c = Controller::new(StandardRules, scripted(&[]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    let err = c.start(Difficulty::Hard).await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyStarted));
    assert_eq!(c.snapshot().difficulty, Some(Difficulty::Easy));
}

#[tokio::test]
async fn reset_clears_everything() {
    let mut c = Controller::new(StandardRules, scripted(&["e7e5", "d8h4"]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("f2"), sq("f3")).unwrap();
    c.confirm().await.unwrap();
    c.submit_human_move(sq("g2"), sq("g4")).unwrap();
    c.confirm().await.unwrap();
    assert!(c.snapshot().result.is_some());

    c.reset();
    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::NotStarted);
    assert_eq!(snap.result, None);
    assert_eq!(snap.difficulty, None);
    assert_eq!(snap.ply, 0);
    assert_eq!(snap.last_move, None);
    assert_eq!(
        snap.position,
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );

    // A reset session can be started again.
    c.start(Difficulty::Medium).await.unwrap();
    assert_eq!(c.snapshot().difficulty, Some(Difficulty::Medium));
}

#[tokio::test]
async fn snapshot_serializes_for_shells() {
    let mut c = Controller::new(StandardRules, scripted(&[]), human_first());
    c.start(Difficulty::Easy).await.unwrap();
    c.submit_human_move(sq("e2"), sq("e4")).unwrap();
    let json = serde_json::to_value(c.snapshot()).unwrap();
    assert_eq!(json["lifecycle"], "awaiting_confirmation");
    assert_eq!(json["active_side"], "automated");
    assert_eq!(json["last_move"], "e2e4");
    assert_eq!(json["difficulty"], "easy");
}

#[tokio::test]
async fn reset_draws_the_first_mover_again() {
    let mut c = Controller::new(StandardRules, scripted(&[]), ChaCha8Rng::seed_from_u64(1));
    let mut seen = [false; 2];
    for _ in 0..32 {
        c.reset();
        let snap = c.snapshot();
        assert_eq!(snap.lifecycle, Lifecycle::NotStarted);
        assert_eq!(snap.human_color, if snap.active_side == Side::Human { 'w' } else { 'b' });
        seen[(snap.active_side == Side::Automated) as usize] = true;
    }
    assert_eq!(seen, [true, true]);
}

#[tokio::test]
async fn reset_from_awaiting_confirmation() {
    let mut c = Controller::new(StandardRules, scripted(&["e7e5"]), human_first());
    c.start(Difficulty::Hard).await.unwrap();
    c.submit_human_move(sq("e2"), sq("e4")).unwrap();
    assert_eq!(c.snapshot().lifecycle, Lifecycle::AwaitingConfirmation);

    c.reset();
    let snap = c.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::NotStarted);
    assert_eq!(snap.difficulty, None);
    assert_eq!(snap.ply, 0);
    assert_eq!(c.provider().calls(), 0);
    assert!(matches!(c.confirm().await, Err(SessionError::NotStarted)));
}
