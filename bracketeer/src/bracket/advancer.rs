//! Recording match results and moving winners forward.

use super::assign::assign_to_match;
use super::errors::{BracketError, BracketResult};
use super::models::{MatchPosition, PlayerId};
use super::tree::Bracket;
use super::verifier::{IntegrityViolation, ViolationKind};
use serde::{Deserialize, Serialize};

/// Outcome of recording one result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advancement {
    /// Matches whose state changed, in the order they were written
    pub changed: Vec<MatchPosition>,
    /// Matches that turned into byes while the winner moved forward
    pub byes_created: Vec<MatchPosition>,
    /// Set when the result decided the final
    pub champion: Option<PlayerId>,
}

impl Bracket {
    /// Record the winner of a ready match and advance them.
    ///
    /// The winner is placed in the first open slot of the next-round match.
    /// If that match can never receive a second player it becomes a bye and
    /// the same player keeps moving forward. Nothing is written unless the
    /// whole advancement succeeds.
    ///
    /// # Arguments
    ///
    /// * `position` - Match being decided
    /// * `winner_id` - One of the two participants
    ///
    /// # Returns
    ///
    /// * `BracketResult<Advancement>` - Changed matches and the champion, if any
    ///
    /// # Errors
    ///
    /// * `BracketError::MatchNotFound` - No match at `position`
    /// * `BracketError::InvalidWinner` - `winner_id` is not a participant
    /// * `BracketError::MatchNotReady` - Match is a bye, decided or incomplete
    /// * `BracketError::SlotConflict` - Next-round match is already full
    /// * `BracketError::IntegrityViolation` - Next-round match can no longer be filled
    pub fn record_winner(
        &mut self,
        position: MatchPosition,
        winner_id: PlayerId,
    ) -> BracketResult<Advancement> {
        let current = self
            .get(position)
            .ok_or(BracketError::MatchNotFound(position))?;

        if !current.has_participant(winner_id) {
            return Err(BracketError::InvalidWinner {
                position,
                winner: winner_id,
            });
        }

        if !current.is_ready() {
            return Err(BracketError::MatchNotReady {
                position,
                status: current.status(),
            });
        }

        let mut staged = self.clone();
        let advancement = staged.advance(position, winner_id)?;
        *self = staged;

        match advancement.champion {
            Some(champion) => log::info!("Player {champion} wins the tournament"),
            None => log::debug!(
                "Player {winner_id} advances from {position}, {} matches updated",
                advancement.changed.len()
            ),
        }

        Ok(advancement)
    }

    fn advance(
        &mut self,
        position: MatchPosition,
        winner_id: PlayerId,
    ) -> BracketResult<Advancement> {
        let mut advancement = Advancement::default();

        self.get_mut(position)
            .ok_or(BracketError::MatchNotFound(position))?
            .winner_id = Some(winner_id);
        advancement.changed.push(position);

        let mut current = position;
        loop {
            if current.round >= self.num_rounds() {
                advancement.champion = Some(winner_id);
                break;
            }

            let target = current.next();
            let expected = self.expected_entrants(target);
            let slot = self
                .get_mut(target)
                .ok_or(BracketError::MatchNotFound(target))?;

            if slot.has_participant(winner_id) {
                return Err(BracketError::IntegrityViolation(IntegrityViolation::new(
                    target,
                    ViolationKind::DuplicateEntrant { player: winner_id },
                )));
            }

            let became_bye = assign_to_match(slot, winner_id, expected)?;
            advancement.changed.push(target);

            if became_bye {
                log::debug!("Player {winner_id} has no opponent in {target}, advancing again");
                advancement.byes_created.push(target);
                current = target;
                continue;
            }

            if self.is_stranded(target) {
                let present = self.get(target).map_or(0, |m| m.occupants());
                return Err(BracketError::IntegrityViolation(IntegrityViolation::new(
                    target,
                    ViolationKind::StrandedMatch { expected, present },
                )));
            }

            break;
        }

        Ok(advancement)
    }
}
