//! Single-elimination bracket engine.
//!
//! The engine works on an in-memory [`Bracket`] and never touches storage:
//!
//! - **Builder**: lays out `log2(next_power_of_two(n))` rounds and seeds
//!   round 1 two players per match, marking a lone player as a bye
//! - **Bye propagator**: pushes bye winners forward until no more byes cascade
//! - **Winner advancer**: records a result and moves the winner into the next
//!   round, resolving any bye that creates
//! - **Integrity verifier**: read-only diagnostics over a match set
//!
//! ## Example
//!
//! ```
//! use bracketeer::bracket::{Bracket, MatchPosition};
//!
//! // Three players: 1 vs 2 in round 1, player 3 gets a bye into the final
//! let mut bracket = Bracket::build(&[1, 2, 3]).unwrap();
//! assert_eq!(bracket.final_match().unwrap().player1_id, Some(3));
//!
//! bracket.record_winner(MatchPosition::new(1, 1), 2).unwrap();
//! let outcome = bracket.record_winner(MatchPosition::new(2, 1), 3).unwrap();
//! assert_eq!(outcome.champion, Some(3));
//! ```

pub mod advancer;
pub mod assign;
pub mod builder;
pub mod errors;
pub mod models;
pub mod propagator;
pub mod tree;
pub mod verifier;

pub use advancer::Advancement;
pub use assign::assign_to_match;
pub use builder::build_skeleton;
pub use errors::{BracketError, BracketResult, MIN_PLAYERS};
pub use models::{
    BracketMatch, BracketShape, MatchPosition, MatchStatus, PlayerId, RoundProgress, round_name,
};
pub use propagator::propagate_byes;
pub use tree::Bracket;
pub use verifier::{IntegrityViolation, ViolationKind, verify_matches};
