//! Forward-fill of bye winners through the later rounds.

use super::assign::assign_to_match;
use super::errors::{BracketError, BracketResult};
use super::models::MatchPosition;
use super::tree::Bracket;

/// Push every bye winner into the next round until no more byes cascade.
///
/// Rounds are processed in order, so a bye created in round `R + 1` is pushed
/// into round `R + 2` on the following pass. Winners already present in their
/// target are skipped, which makes the pass safe to repeat.
///
/// # Returns
///
/// * `BracketResult<usize>` - Number of byes created beyond round 1
///
/// # Errors
///
/// * `BracketError::SlotConflict` - A target already holds two other players
pub fn propagate_byes(bracket: &mut Bracket) -> BracketResult<usize> {
    let mut created = 0;

    for round in 1..bracket.num_rounds() {
        for number in 1..=bracket.matches_in_round(round + 1) {
            let target = MatchPosition::new(round + 1, number);
            let Some((first, second)) = target.feeders() else {
                continue;
            };
            let expected = bracket.expected_entrants(target);

            for feeder in [first, second] {
                let Some(winner) = bracket
                    .get(feeder)
                    .filter(|m| m.is_bye)
                    .and_then(|m| m.winner_id)
                else {
                    continue;
                };

                let slot = bracket
                    .get_mut(target)
                    .ok_or(BracketError::MatchNotFound(target))?;
                if slot.has_participant(winner) {
                    continue;
                }

                if assign_to_match(slot, winner, expected)? {
                    created += 1;
                    log::debug!("Bye winner {winner} from {feeder} also advances through {target}");
                } else {
                    log::trace!("Bye winner {winner} from {feeder} placed in {target}");
                }
            }
        }
    }

    Ok(created)
}
