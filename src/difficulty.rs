use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// How hard the automated side plays. Fixed when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// The think time granted to the provider at this level.
    pub fn movetime(self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_secs(1),
            Difficulty::Medium => Duration::from_secs(2),
            Difficulty::Hard => Duration::from_secs(3),
        }
    }

    pub fn budget(self) -> StrengthBudget {
        StrengthBudget {
            difficulty: self,
            movetime: self.movetime(),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty {0:?}, expected easy, medium, hard or 1-3")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "1" => Ok(Difficulty::Easy),
            "medium" | "2" => Ok(Difficulty::Medium),
            "hard" | "3" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// The effort allowance handed to a move provider for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrengthBudget {
    pub difficulty: Difficulty,
    pub movetime: Duration,
}
