//! Tournament lifecycle on top of the bracket engine.
//!
//! The manager creates tournaments from a list of names, records results
//! through the engine and persists every change through a
//! [`BracketRepository`](crate::db::BracketRepository).
//!
//! ## Example
//!
//! ```
//! use bracketeer::db::MemoryBracketRepository;
//! use bracketeer::tournament::{TournamentManager, parse_player_list};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(MemoryBracketRepository::new()));
//!
//!     let names = parse_player_list("Alice\nBob\nCharlie\n");
//!     let data = manager.create_tournament("Office Cup", &names).await?;
//!
//!     // Charlie has a bye straight into the final
//!     let first = &data.matches[0];
//!     let winner = first.bracket.player1_id.ok_or("empty match")?;
//!     manager.set_winner(first.id, winner).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod input;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use input::{parse_player_list, shuffle_players};
pub use manager::TournamentManager;
pub use models::{
    MatchId, MatchRecord, MatchUpdate, NewPlayer, Player, Tournament, TournamentData,
    TournamentId, TournamentSummary,
};
