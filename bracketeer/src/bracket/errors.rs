//! Bracket engine error types.

use super::models::{MatchPosition, MatchStatus, PlayerId};
use super::verifier::IntegrityViolation;
use thiserror::Error;

/// Minimum number of entrants for a bracket
pub const MIN_PLAYERS: usize = 2;

/// Bracket engine errors
///
/// Every operation that returns one of these leaves the bracket untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    /// Too few players to build a bracket
    #[error("At least {needed} players are required, got {provided}")]
    Validation { needed: usize, provided: usize },

    /// Winner is not one of the match participants
    #[error("Player {winner} is not a participant of match {position}")]
    InvalidWinner {
        position: MatchPosition,
        winner: PlayerId,
    },

    /// Next-round match already has both slots filled
    #[error("Match {position} has no open slot for player {player}")]
    SlotConflict {
        position: MatchPosition,
        player: PlayerId,
    },

    /// Advancement uncovered an inconsistent bracket
    #[error("Integrity violation: {0}")]
    IntegrityViolation(IntegrityViolation),

    /// No match at the given position
    #[error("Match {0} does not exist in this bracket")]
    MatchNotFound(MatchPosition),

    /// Match cannot take a result in its current status
    #[error("Match {position} is not ready for a result (status: {status})")]
    MatchNotReady {
        position: MatchPosition,
        status: MatchStatus,
    },

    /// Stored matches do not form a complete bracket
    #[error("Malformed bracket: {0}")]
    MalformedBracket(String),
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;
