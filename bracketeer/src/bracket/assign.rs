//! Slot assignment shared by bracket construction, bye propagation and live
//! advancement.

use super::errors::{BracketError, BracketResult};
use super::models::{BracketMatch, PlayerId};

/// Place a player into the first open slot of a match.
///
/// `player1` is filled before `player2`. A lone occupant of `player2` is moved
/// to `player1` before the bye check, so a bye always sits in `player1`. The
/// match becomes a bye when it holds exactly one player and `expected_entrants`
/// says nobody else can ever arrive.
///
/// # Arguments
///
/// * `target` - Match receiving the player
/// * `player_id` - Player to place
/// * `expected_entrants` - How many players this match will ever receive
///
/// # Returns
///
/// * `BracketResult<bool>` - Whether the match just became a bye
///
/// # Errors
///
/// * `BracketError::SlotConflict` - Both slots are already occupied; the match
///   is left unchanged
pub fn assign_to_match(
    target: &mut BracketMatch,
    player_id: PlayerId,
    expected_entrants: usize,
) -> BracketResult<bool> {
    if target.player1_id.is_none() {
        target.player1_id = Some(player_id);
    } else if target.player2_id.is_none() {
        target.player2_id = Some(player_id);
    } else {
        return Err(BracketError::SlotConflict {
            position: target.position(),
            player: player_id,
        });
    }

    Ok(settle(target, expected_entrants))
}

/// Normalize a match and mark it as a bye if it can never be contested.
///
/// Returns `true` only on the transition into a bye.
pub fn settle(target: &mut BracketMatch, expected_entrants: usize) -> bool {
    if target.player1_id.is_none() && target.player2_id.is_some() {
        target.player1_id = target.player2_id.take();
    }

    if target.is_bye || target.occupants() != 1 || expected_entrants != 1 {
        return false;
    }

    target.is_bye = true;
    target.winner_id = target.player1_id;
    true
}
