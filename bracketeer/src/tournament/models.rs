//! Tournament records as stored by the repository.

use crate::bracket::{Bracket, BracketMatch, BracketResult, MatchPosition, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = i64;

/// Match ID type
pub type MatchId = i64;

/// Tournament header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Registered player. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// Position in the seeding order (1-indexed)
    pub seed_position: u32,
}

/// Player to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub seed_position: u32,
}

impl NewPlayer {
    /// Number a list of names in seeding order, starting at 1
    pub fn seeded(names: &[String]) -> Vec<Self> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| Self {
                name: name.clone(),
                seed_position: idx as u32 + 1,
            })
            .collect()
    }
}

/// Stored match: a bracket match plus its storage identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    #[serde(flatten)]
    pub bracket: BracketMatch,
}

impl MatchRecord {
    pub fn position(&self) -> MatchPosition {
        self.bracket.position()
    }

    /// Apply an update to the mutable fields
    pub fn apply(&mut self, update: &MatchUpdate) {
        self.bracket.player1_id = update.player1_id;
        self.bracket.player2_id = update.player2_id;
        self.bracket.winner_id = update.winner_id;
        self.bracket.is_bye = update.is_bye;
    }
}

/// New values for the mutable fields of a match.
///
/// Position and ownership never change, so an update always carries the
/// complete mutable state and is written atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
    pub is_bye: bool,
}

impl From<&BracketMatch> for MatchUpdate {
    fn from(m: &BracketMatch) -> Self {
        Self {
            player1_id: m.player1_id,
            player2_id: m.player2_id,
            winner_id: m.winner_id,
            is_bye: m.is_bye,
        }
    }
}

/// Everything needed to display one tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentData {
    pub tournament: Tournament,
    /// Players ordered by seed position
    pub players: Vec<Player>,
    /// Matches ordered by round then match number
    pub matches: Vec<MatchRecord>,
}

impl TournamentData {
    /// Reassemble the in-memory bracket
    pub fn bracket(&self) -> BracketResult<Bracket> {
        Bracket::from_matches(self.matches.iter().map(|m| m.bracket.clone()))
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Player name, or "TBD" for an empty slot
    pub fn display_name(&self, player_id: Option<PlayerId>) -> &str {
        player_id
            .and_then(|id| self.player(id))
            .map_or("TBD", |p| p.name.as_str())
    }

    pub fn match_at(&self, position: MatchPosition) -> Option<&MatchRecord> {
        self.matches.iter().find(|m| m.position() == position)
    }

    pub fn champion(&self) -> Option<&Player> {
        let final_round = self.matches.iter().map(|m| m.bracket.round_number).max()?;
        self.matches
            .iter()
            .find(|m| m.bracket.round_number == final_round)
            .and_then(|m| m.bracket.winner_id)
            .and_then(|id| self.player(id))
    }
}

/// Tournament list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub tournament: Tournament,
    pub player_count: usize,
    /// Matches with a winner, byes included
    pub completed_matches: usize,
    pub total_matches: usize,
    pub champion: Option<String>,
}

impl TournamentSummary {
    pub fn from_data(data: &TournamentData) -> Self {
        Self {
            tournament: data.tournament.clone(),
            player_count: data.players.len(),
            completed_matches: data
                .matches
                .iter()
                .filter(|m| m.bracket.winner_id.is_some())
                .count(),
            total_matches: data.matches.len(),
            champion: data.champion().map(|p| p.name.clone()),
        }
    }
}
