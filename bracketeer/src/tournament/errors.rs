//! Tournament error types.

use super::models::{MatchId, TournamentId};
use crate::bracket::BracketError;
use crate::db::timeouts::TimeoutError;
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Tournament not found
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Request rejected before touching storage
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bracket engine rejected the operation
    #[error(transparent)]
    Bracket(#[from] BracketError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage call exceeded its time budget
    #[error(transparent)]
    Timeout(TimeoutError),

    /// Non-database storage failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::Storage(_) => {
                "Internal server error".to_string()
            }
            TournamentError::Timeout(_) => "Storage is not responding, please retry".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<TimeoutError> for TournamentError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Database(e) => TournamentError::Database(e),
            timeout => TournamentError::Timeout(timeout),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
