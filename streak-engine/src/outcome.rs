//! Binary trial outcomes and their textual encodings.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StreakError;

/// Result of a single trial.
///
/// Serializes as `"W"`/`"L"`; deserializes from any token
/// [`Outcome::from_token`] accepts, or from a JSON bool or `1`/`0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OutcomeToken")]
pub enum Outcome {
    #[serde(rename = "W")]
    Success,
    #[serde(rename = "L")]
    Failure,
}

/// Raw JSON shapes a feed may use for one outcome.
#[derive(Deserialize)]
#[serde(untagged)]
enum OutcomeToken {
    Flag(bool),
    Number(u64),
    Text(String),
}

impl TryFrom<OutcomeToken> for Outcome {
    type Error = StreakError;

    fn try_from(token: OutcomeToken) -> Result<Self, Self::Error> {
        match token {
            OutcomeToken::Flag(made) => Ok(Self::from_bool(made)),
            OutcomeToken::Number(1) => Ok(Self::Success),
            OutcomeToken::Number(0) => Ok(Self::Failure),
            OutcomeToken::Number(other) => Err(StreakError::invalid(format!(
                "unrecognised outcome number {other}"
            ))),
            OutcomeToken::Text(text) => Self::from_token(&text),
        }
    }
}

impl Outcome {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub const fn from_bool(made: bool) -> Self {
        if made { Self::Success } else { Self::Failure }
    }

    /// Single-character encoding used by raw sequence strings.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Success => 'W',
            Self::Failure => 'L',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'W' | 'w' | '1' => Some(Self::Success),
            'L' | 'l' | '0' => Some(Self::Failure),
            _ => None,
        }
    }

    /// Parse a whole token as exported by play-by-play feeds
    /// (`Made`/`Missed`, `true`/`false`, `1`/`0`, `W`/`L`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the token is not a recognised outcome.
    pub fn from_token(token: &str) -> Result<Self, StreakError> {
        let trimmed = token.trim();
        let parsed = match trimmed.to_ascii_lowercase().as_str() {
            "w" | "1" | "made" | "make" | "true" => Some(Self::Success),
            "l" | "0" | "missed" | "miss" | "false" => Some(Self::Failure),
            _ => None,
        };
        parsed.ok_or_else(|| {
            StreakError::invalid(format!("unrecognised outcome token `{trimmed}`"))
        })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Parse a W/L string (whitespace ignored) into outcomes.
///
/// # Errors
///
/// Returns `InvalidInput` naming the first character that is not a valid outcome.
pub fn parse_outcomes(encoded: &str) -> Result<Vec<Outcome>, StreakError> {
    encoded
        .chars()
        .filter(|c| !c.is_whitespace())
        .enumerate()
        .map(|(idx, c)| {
            Outcome::from_char(c).ok_or_else(|| {
                StreakError::invalid(format!("unexpected character `{c}` at position {idx}"))
            })
        })
        .collect()
}

/// Render outcomes back into the raw W/L encoding.
#[must_use]
pub fn encode_outcomes(outcomes: &[Outcome]) -> String {
    outcomes.iter().map(|o| o.as_char()).collect()
}
