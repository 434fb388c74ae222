use async_trait::async_trait;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shakmaty::{uci::Uci, CastlingMode, Chess, Position};

use super::{MoveProvider, ProviderError};
use crate::difficulty::StrengthBudget;

/// Plays a uniformly random legal move. Ignores the budget.
#[derive(Debug, Clone)]
pub struct RandomMover {
    rng: ChaCha8Rng,
}

impl RandomMover {
    pub fn new(seed: u64) -> RandomMover {
        RandomMover {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> RandomMover {
        RandomMover {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

#[async_trait]
impl MoveProvider for RandomMover {
    fn name(&self) -> &str {
        "random"
    }

    async fn choose_move(
        &mut self,
        position: &Chess,
        _budget: StrengthBudget,
    ) -> Result<Uci, ProviderError> {
        position
            .legal_moves()
            .choose(&mut self.rng)
            .map(|m| m.to_uci(CastlingMode::Standard))
            .ok_or(ProviderError::NoMove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;

    #[tokio::test]
    async fn same_seed_same_moves() {
        let pos = Chess::default();
        let mut a = RandomMover::new(7);
        let mut b = RandomMover::new(7);
        for _ in 0..5 {
            let budget = Difficulty::Easy.budget();
            assert_eq!(
                a.choose_move(&pos, budget).await.unwrap(),
                b.choose_move(&pos, budget).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn no_legal_moves_is_no_move() {
        use std::str::FromStr;
        let mated: Chess = shakmaty::fen::Fen::from_str(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap()
        .into_position(CastlingMode::Standard)
        .unwrap();
        let err = RandomMover::new(1)
            .choose_move(&mated, Difficulty::Hard.budget())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::NoMove);
    }
}
