use std::{collections::VecDeque, str::FromStr};

use async_trait::async_trait;
use shakmaty::{uci::Uci, Chess};

use super::{MoveProvider, ProviderError};
use crate::difficulty::StrengthBudget;

/// Answers with a fixed list of moves, in order, then runs dry.
///
/// The moves are not checked against the position, which makes this the
/// provider of choice for exercising the controller's own checks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    moves: VecDeque<Uci>,
    budgets: Vec<StrengthBudget>,
}

impl ScriptedProvider {
    pub fn new(moves: impl IntoIterator<Item = Uci>) -> ScriptedProvider {
        ScriptedProvider {
            moves: moves.into_iter().collect(),
            budgets: Vec::new(),
        }
    }

    /// Builds a script from UCI strings such as `"e7e5"`.
    pub fn parse<'a>(moves: impl IntoIterator<Item = &'a str>) -> Result<Self, ProviderError> {
        let moves = moves
            .into_iter()
            .map(|s| Uci::from_str(s).map_err(|_| ProviderError::Protocol(format!("bad move {s}"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScriptedProvider::new(moves))
    }

    /// Budgets of every call so far.
    pub fn budgets(&self) -> &[StrengthBudget] {
        &self.budgets
    }

    pub fn calls(&self) -> usize {
        self.budgets.len()
    }

    pub fn remaining(&self) -> usize {
        self.moves.len()
    }
}

#[async_trait]
impl MoveProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn choose_move(
        &mut self,
        _position: &Chess,
        budget: StrengthBudget,
    ) -> Result<Uci, ProviderError> {
        self.budgets.push(budget);
        self.moves.pop_front().ok_or(ProviderError::NoMove)
    }
}
