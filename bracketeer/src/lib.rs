//! # Bracketeer
//!
//! Single-elimination tournament brackets with automatic bye handling.
//!
//! The bracket engine is pure and synchronous: it builds a bracket from an
//! ordered list of players, resolves byes, advances winners and checks a
//! bracket for inconsistencies. Persistence and orchestration sit on top of
//! it and never leak into the engine.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Builder, bye propagation, winner advancement, integrity checks
//! - [`db`]: PostgreSQL pool, configuration and the repository trait
//! - [`tournament`]: Tournament manager and stored records
//!
//! ## Example
//!
//! ```
//! use bracketeer::{Bracket, BracketShape};
//!
//! let shape = BracketShape::for_players(5);
//! assert_eq!((shape.total_slots, shape.num_rounds, shape.empty_slots), (8, 3, 3));
//!
//! let bracket = Bracket::build(&[1, 2, 3, 4, 5]).unwrap();
//! assert_eq!(bracket.matches().len(), 7);
//! assert!(bracket.verify().is_empty());
//! ```

/// Pure bracket engine.
pub mod bracket;
pub use bracket::{
    Advancement, Bracket, BracketError, BracketMatch, BracketResult, BracketShape,
    IntegrityViolation, MatchPosition, MatchStatus, PlayerId, ViolationKind,
};

/// Storage: connection pool, repositories, timeouts.
pub mod db;

/// Tournament orchestration over the engine and a repository.
pub mod tournament;
pub use tournament::{TournamentError, TournamentManager, TournamentResult};
