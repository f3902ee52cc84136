//! Bracket data models shared by the builder, propagator, advancer and verifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Player ID type
pub type PlayerId = i64;

/// Coordinates of a match inside a bracket.
///
/// Rounds and match numbers are 1-indexed. The match at `(round, number)` is
/// fed by `(round - 1, 2 * number - 1)` and `(round - 1, 2 * number)` and feeds
/// `(round + 1, (number - 1) / 2 + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchPosition {
    /// Round number (1-indexed, the final is the last round)
    pub round: u32,
    /// Match number within the round (1-indexed)
    pub number: u32,
}

impl MatchPosition {
    /// Create a new match position
    pub fn new(round: u32, number: u32) -> Self {
        Self { round, number }
    }

    /// Position of the match this one feeds in the next round
    pub fn next(&self) -> Self {
        Self {
            round: self.round.saturating_add(1),
            number: self.number.saturating_sub(1) / 2 + 1,
        }
    }

    /// Positions of the two matches feeding this one
    ///
    /// `None` in round 1, and for match numbers with no feeders (zero, or too
    /// large to double).
    pub fn feeders(&self) -> Option<(Self, Self)> {
        if self.round <= 1 {
            return None;
        }

        let second = self.number.checked_mul(2)?;
        let first = second.checked_sub(1)?;
        Some((
            Self::new(self.round - 1, first),
            Self::new(self.round - 1, second),
        ))
    }
}

impl fmt::Display for MatchPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}M{}", self.round, self.number)
    }
}

/// A single match in the bracket.
///
/// Only the participant, winner and bye fields change after the bracket has
/// been built; the position is fixed for the lifetime of the tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    /// Round number (1-indexed)
    pub round_number: u32,
    /// Match number within the round (1-indexed)
    pub match_number: u32,
    /// Occupant of the first slot
    pub player1_id: Option<PlayerId>,
    /// Occupant of the second slot
    pub player2_id: Option<PlayerId>,
    /// Recorded winner, always one of the two occupants
    pub winner_id: Option<PlayerId>,
    /// Whether the single occupant advanced without playing
    pub is_bye: bool,
}

impl BracketMatch {
    /// Create an empty match at the given position
    pub fn empty(position: MatchPosition) -> Self {
        Self {
            round_number: position.round,
            match_number: position.number,
            player1_id: None,
            player2_id: None,
            winner_id: None,
            is_bye: false,
        }
    }

    pub fn position(&self) -> MatchPosition {
        MatchPosition::new(self.round_number, self.match_number)
    }

    /// Number of occupied slots (0, 1 or 2)
    pub fn occupants(&self) -> usize {
        usize::from(self.player1_id.is_some()) + usize::from(self.player2_id.is_some())
    }

    /// Check whether a player occupies either slot
    pub fn has_participant(&self, player_id: PlayerId) -> bool {
        self.player1_id == Some(player_id) || self.player2_id == Some(player_id)
    }

    /// Current status of the match
    pub fn status(&self) -> MatchStatus {
        if self.is_bye {
            MatchStatus::Bye
        } else if self.winner_id.is_some() {
            MatchStatus::Completed
        } else if self.player1_id.is_some() && self.player2_id.is_some() {
            MatchStatus::Ready
        } else {
            MatchStatus::Waiting
        }
    }

    /// A result can be recorded only for ready matches
    pub fn is_ready(&self) -> bool {
        self.status() == MatchStatus::Ready
    }
}

/// Match status as shown to the person running the bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Single entrant advanced automatically
    Bye,
    /// Winner recorded
    Completed,
    /// Both entrants known, awaiting a result
    Ready,
    /// At least one entrant still to be decided
    Waiting,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStatus::Bye => "bye",
            MatchStatus::Completed => "completed",
            MatchStatus::Ready => "ready",
            MatchStatus::Waiting => "waiting",
        };
        f.write_str(label)
    }
}

/// Completion counts for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundProgress {
    pub round: u32,
    /// Matches with a winner (byes included)
    pub completed: usize,
    pub total: usize,
}

impl RoundProgress {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Size of a bracket for a given player count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketShape {
    /// Number of entrants
    pub players: usize,
    /// First-round positions, the next power of two at or above `players`
    pub total_slots: usize,
    /// Number of rounds, `log2(total_slots)`
    pub num_rounds: u32,
    /// First-round positions left without a player
    pub empty_slots: usize,
}

impl BracketShape {
    /// Compute the shape for `players` entrants
    ///
    /// A single player still occupies one slot and zero rounds; callers reject
    /// fewer than two players before building.
    pub fn for_players(players: usize) -> Self {
        let total_slots = players.max(1).next_power_of_two();
        Self {
            players,
            total_slots,
            num_rounds: total_slots.trailing_zeros(),
            empty_slots: total_slots - players.min(total_slots),
        }
    }

    /// Total number of matches across all rounds
    pub fn total_matches(&self) -> usize {
        self.total_slots - 1
    }

    /// Number of matches in the given round
    pub fn matches_in_round(&self, round: u32) -> usize {
        if round == 0 || round > self.num_rounds {
            0
        } else {
            1 << (self.num_rounds - round)
        }
    }
}

/// Display name for a round
pub fn round_name(round: u32, num_rounds: u32) -> String {
    if round == num_rounds {
        "Final".to_string()
    } else if round + 1 == num_rounds {
        "Semifinal".to_string()
    } else if round + 2 == num_rounds {
        "Quarterfinal".to_string()
    } else {
        format!("Round {round}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_position() {
        assert_eq!(MatchPosition::new(1, 1).next(), MatchPosition::new(2, 1));
        assert_eq!(MatchPosition::new(1, 2).next(), MatchPosition::new(2, 1));
        assert_eq!(MatchPosition::new(1, 3).next(), MatchPosition::new(2, 2));
        assert_eq!(MatchPosition::new(2, 4).next(), MatchPosition::new(3, 2));
    }

    #[test]
    fn test_feeders() {
        assert_eq!(MatchPosition::new(1, 3).feeders(), None);
        assert_eq!(
            MatchPosition::new(3, 2).feeders(),
            Some((MatchPosition::new(2, 3), MatchPosition::new(2, 4)))
        );
    }

    #[test]
    fn test_positions_at_the_edges() {
        assert_eq!(MatchPosition::new(1, 0).next(), MatchPosition::new(2, 1));
        assert_eq!(MatchPosition::new(u32::MAX, 1).next().round, u32::MAX);
        assert_eq!(MatchPosition::new(3, 0).feeders(), None);
        assert_eq!(MatchPosition::new(40, u32::MAX).feeders(), None);
    }

    #[test]
    fn test_status() {
        let mut m = BracketMatch::empty(MatchPosition::new(1, 1));
        assert_eq!(m.status(), MatchStatus::Waiting);

        m.player1_id = Some(1);
        m.player2_id = Some(2);
        assert_eq!(m.status(), MatchStatus::Ready);

        m.winner_id = Some(2);
        assert_eq!(m.status(), MatchStatus::Completed);

        let mut bye = BracketMatch::empty(MatchPosition::new(1, 2));
        bye.player1_id = Some(3);
        bye.winner_id = Some(3);
        bye.is_bye = true;
        assert_eq!(bye.status(), MatchStatus::Bye);
    }

    #[test]
    fn test_shape() {
        let shape = BracketShape::for_players(5);
        assert_eq!(shape.total_slots, 8);
        assert_eq!(shape.num_rounds, 3);
        assert_eq!(shape.empty_slots, 3);
        assert_eq!(shape.total_matches(), 7);
        assert_eq!(shape.matches_in_round(1), 4);
        assert_eq!(shape.matches_in_round(3), 1);
        assert_eq!(shape.matches_in_round(4), 0);

        let exact = BracketShape::for_players(8);
        assert_eq!(exact.total_slots, 8);
        assert_eq!(exact.empty_slots, 0);

        let pair = BracketShape::for_players(2);
        assert_eq!(pair.num_rounds, 1);
        assert_eq!(pair.total_matches(), 1);
    }

    #[test]
    fn test_round_names() {
        assert_eq!(round_name(4, 4), "Final");
        assert_eq!(round_name(3, 4), "Semifinal");
        assert_eq!(round_name(2, 4), "Quarterfinal");
        assert_eq!(round_name(1, 4), "Round 1");
        assert_eq!(round_name(1, 1), "Final");
    }
}
