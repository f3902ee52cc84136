//! Bracket construction: match skeleton plus first-round seeding.

use super::assign::assign_to_match;
use super::errors::{BracketError, BracketResult, MIN_PLAYERS};
use super::models::{BracketShape, MatchPosition, PlayerId};
use super::propagator::propagate_byes;
use super::tree::{Bracket, MAX_ROUNDS};
use std::collections::HashSet;

impl Bracket {
    /// Build a bracket for players in seeding order and push first-round byes
    /// forward.
    ///
    /// # Arguments
    ///
    /// * `players` - Player IDs, already in their final seeding order
    ///
    /// # Returns
    ///
    /// * `BracketResult<Bracket>` - Bracket with every bye resolved
    ///
    /// # Errors
    ///
    /// * `BracketError::Validation` - Fewer than two players
    /// * `BracketError::MalformedBracket` - Duplicate player or too many players
    pub fn build(players: &[PlayerId]) -> BracketResult<Self> {
        let mut bracket = build_skeleton(players)?;
        let cascaded = propagate_byes(&mut bracket)?;

        log::debug!(
            "Bracket ready: {} rounds, {} matches, {} byes after round 1",
            bracket.num_rounds(),
            bracket.matches().len(),
            cascaded
        );

        Ok(bracket)
    }
}

/// Lay out every round and seed round 1 two players per match.
///
/// Players fill round-1 matches in order. With an odd player count the last
/// seeded match holds a single player and is marked a bye; matches after it
/// stay empty.
pub fn build_skeleton(players: &[PlayerId]) -> BracketResult<Bracket> {
    if players.len() < MIN_PLAYERS {
        return Err(BracketError::Validation {
            needed: MIN_PLAYERS,
            provided: players.len(),
        });
    }

    let mut seen = HashSet::with_capacity(players.len());
    if let Some(duplicate) = players.iter().find(|&&id| !seen.insert(id)) {
        return Err(BracketError::MalformedBracket(format!(
            "player {duplicate} is seeded more than once"
        )));
    }

    let shape = BracketShape::for_players(players.len());
    if shape.num_rounds > MAX_ROUNDS {
        return Err(BracketError::MalformedBracket(format!(
            "{} players exceeds the supported bracket size",
            players.len()
        )));
    }

    let mut bracket = Bracket::skeleton(shape.num_rounds);

    for (idx, pair) in players.chunks(2).enumerate() {
        let position = MatchPosition::new(1, idx as u32 + 1);
        let slot = bracket
            .get_mut(position)
            .ok_or(BracketError::MatchNotFound(position))?;

        for &player_id in pair {
            if assign_to_match(slot, player_id, pair.len())? {
                log::debug!("Player {player_id} receives a bye in {position}");
            }
        }
    }

    log::info!(
        "Built bracket for {} players: {} slots, {} rounds",
        shape.players,
        shape.total_slots,
        shape.num_rounds
    );

    Ok(bracket)
}
