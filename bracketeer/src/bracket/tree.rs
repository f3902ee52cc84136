//! In-memory bracket: every match of one tournament laid out round by round.

use super::errors::{BracketError, BracketResult};
use super::models::{BracketMatch, MatchPosition, PlayerId, RoundProgress};
use serde::{Deserialize, Serialize};

/// Largest number of rounds a bracket may have
pub const MAX_ROUNDS: u32 = 24;

/// Complete single-elimination bracket.
///
/// Matches are stored round by round, each round ordered by match number, so
/// the match at `(round, number)` lives at a fixed index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredBracket")]
pub struct Bracket {
    num_rounds: u32,
    matches: Vec<BracketMatch>,
}

/// Serialized form of a [`Bracket`], checked by `from_matches` on the way in
#[derive(Deserialize)]
struct StoredBracket {
    num_rounds: u32,
    matches: Vec<BracketMatch>,
}

impl TryFrom<StoredBracket> for Bracket {
    type Error = BracketError;

    fn try_from(stored: StoredBracket) -> BracketResult<Self> {
        let bracket = Self::from_matches(stored.matches)?;
        if bracket.num_rounds != stored.num_rounds {
            return Err(BracketError::MalformedBracket(format!(
                "matches span {} rounds, header says {}",
                bracket.num_rounds, stored.num_rounds
            )));
        }
        Ok(bracket)
    }
}

impl Bracket {
    /// Create a bracket of empty matches
    pub(crate) fn skeleton(num_rounds: u32) -> Self {
        let mut matches = Vec::with_capacity((1usize << num_rounds) - 1);
        for round in 1..=num_rounds {
            let count = 1u32 << (num_rounds - round);
            for number in 1..=count {
                matches.push(BracketMatch::empty(MatchPosition::new(round, number)));
            }
        }

        Self {
            num_rounds,
            matches,
        }
    }

    /// Reassemble a bracket from stored matches in any order
    ///
    /// # Errors
    ///
    /// * `BracketError::MalformedBracket` - Matches are missing, duplicated or
    ///   outside the bracket's shape
    pub fn from_matches<I>(matches: I) -> BracketResult<Self>
    where
        I: IntoIterator<Item = BracketMatch>,
    {
        let mut matches: Vec<BracketMatch> = matches.into_iter().collect();
        let num_rounds = matches
            .iter()
            .map(|m| m.round_number)
            .max()
            .ok_or_else(|| BracketError::MalformedBracket("no matches".to_string()))?;

        if num_rounds > MAX_ROUNDS {
            return Err(BracketError::MalformedBracket(format!(
                "{num_rounds} rounds exceeds the limit of {MAX_ROUNDS}"
            )));
        }

        let expected_total = (1usize << num_rounds) - 1;
        if matches.len() != expected_total {
            return Err(BracketError::MalformedBracket(format!(
                "expected {expected_total} matches for {num_rounds} rounds, found {}",
                matches.len()
            )));
        }

        matches.sort_by_key(|m| m.position());

        let bracket = Self {
            num_rounds,
            matches,
        };

        let skeleton = Self::skeleton(num_rounds);
        for (stored, expected) in bracket.matches.iter().zip(skeleton.matches.iter()) {
            if stored.position() != expected.position() {
                return Err(BracketError::MalformedBracket(format!(
                    "expected match {}, found {}",
                    expected.position(),
                    stored.position()
                )));
            }
        }

        Ok(bracket)
    }

    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    /// First-round positions, `2^num_rounds`
    pub fn total_slots(&self) -> usize {
        1 << self.num_rounds
    }

    /// All matches, ordered by round then match number
    pub fn matches(&self) -> &[BracketMatch] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<BracketMatch> {
        self.matches
    }

    /// Number of matches in a round (0 for rounds outside the bracket)
    pub fn matches_in_round(&self, round: u32) -> u32 {
        if round == 0 || round > self.num_rounds {
            0
        } else {
            1 << (self.num_rounds - round)
        }
    }

    fn index_of(&self, position: MatchPosition) -> Option<usize> {
        let count = self.matches_in_round(position.round);
        if position.number == 0 || position.number > count {
            return None;
        }

        let offset = self.total_slots() - (1usize << (self.num_rounds - position.round + 1));
        Some(offset + position.number as usize - 1)
    }

    /// Get the match at a position
    pub fn get(&self, position: MatchPosition) -> Option<&BracketMatch> {
        self.index_of(position).and_then(|idx| self.matches.get(idx))
    }

    pub(crate) fn get_mut(&mut self, position: MatchPosition) -> Option<&mut BracketMatch> {
        self.index_of(position)
            .and_then(|idx| self.matches.get_mut(idx))
    }

    /// Matches of one round, ordered by match number
    pub fn round(&self, round: u32) -> &[BracketMatch] {
        match self.index_of(MatchPosition::new(round, 1)) {
            Some(start) => self
                .matches
                .get(start..start + self.matches_in_round(round) as usize)
                .unwrap_or_default(),
            None => &[],
        }
    }

    /// The single match of the last round
    pub fn final_match(&self) -> Option<&BracketMatch> {
        self.matches.last()
    }

    /// Winner of the final, once decided
    pub fn champion(&self) -> Option<PlayerId> {
        self.final_match().and_then(|m| m.winner_id)
    }

    pub fn is_complete(&self) -> bool {
        self.champion().is_some()
    }

    /// Matches waiting for a result, in bracket order
    pub fn ready_matches(&self) -> impl Iterator<Item = &BracketMatch> {
        self.matches.iter().filter(|m| m.is_ready())
    }

    /// Completion per round. Matches that will never be played are not counted.
    pub fn round_progress(&self) -> Vec<RoundProgress> {
        (1..=self.num_rounds)
            .map(|round| {
                let live: Vec<&BracketMatch> = self
                    .round(round)
                    .iter()
                    .filter(|m| !self.is_dead(m.position()))
                    .collect();

                RoundProgress {
                    round,
                    completed: live.iter().filter(|m| m.winner_id.is_some()).count(),
                    total: live.len(),
                }
            })
            .collect()
    }

    /// Whether a match can never receive a player
    pub fn is_dead(&self, position: MatchPosition) -> bool {
        is_dead_in(&|p| self.get(p), position)
    }

    /// How many players a match will receive over the whole tournament
    pub fn expected_entrants(&self, position: MatchPosition) -> usize {
        expected_entrants_in(&|p| self.get(p), position)
    }

    /// Feeders that can still deliver a player but have no winner yet
    pub fn pending_feeders(&self, position: MatchPosition) -> usize {
        pending_feeders_in(&|p| self.get(p), position)
    }

    /// Whether a match lacks entrants that no feeder can still deliver
    pub fn is_stranded(&self, position: MatchPosition) -> bool {
        self.get(position)
            .is_some_and(|m| is_stranded_in(&|p| self.get(p), m))
    }
}

/// A round-1 match with nobody in it, or a later match whose feeders are both dead.
///
/// Missing matches are dead and occupied ones are live, so only empty
/// subtrees are walked.
pub(crate) fn is_dead_in<'a, F>(lookup: &F, position: MatchPosition) -> bool
where
    F: Fn(MatchPosition) -> Option<&'a BracketMatch>,
{
    let Some(m) = lookup(position) else {
        return true;
    };
    if m.occupants() > 0 {
        return false;
    }

    match position.feeders() {
        None => true,
        Some((first, second)) => is_dead_in(lookup, first) && is_dead_in(lookup, second),
    }
}

pub(crate) fn expected_entrants_in<'a, F>(lookup: &F, position: MatchPosition) -> usize
where
    F: Fn(MatchPosition) -> Option<&'a BracketMatch>,
{
    match position.feeders() {
        None => lookup(position).map_or(0, BracketMatch::occupants),
        Some((first, second)) => [first, second]
            .into_iter()
            .filter(|&feeder| !is_dead_in(lookup, feeder))
            .count(),
    }
}

pub(crate) fn pending_feeders_in<'a, F>(lookup: &F, position: MatchPosition) -> usize
where
    F: Fn(MatchPosition) -> Option<&'a BracketMatch>,
{
    match position.feeders() {
        None => 0,
        Some((first, second)) => [first, second]
            .into_iter()
            .filter(|&feeder| {
                !is_dead_in(lookup, feeder)
                    && lookup(feeder).is_some_and(|m| m.winner_id.is_none())
            })
            .count(),
    }
}

pub(crate) fn is_stranded_in<'a, F>(lookup: &F, m: &BracketMatch) -> bool
where
    F: Fn(MatchPosition) -> Option<&'a BracketMatch>,
{
    let position = m.position();
    position.round > 1
        && !m.is_bye
        && pending_feeders_in(lookup, position) == 0
        && m.occupants() < expected_entrants_in(lookup, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_layout() {
        let bracket = Bracket::skeleton(3);
        assert_eq!(bracket.matches().len(), 7);
        assert_eq!(bracket.round(1).len(), 4);
        assert_eq!(bracket.round(2).len(), 2);
        assert_eq!(bracket.round(3).len(), 1);
        assert!(bracket.round(4).is_empty());

        for (idx, m) in bracket.round(2).iter().enumerate() {
            assert_eq!(m.round_number, 2);
            assert_eq!(m.match_number as usize, idx + 1);
        }
    }

    #[test]
    fn test_get_by_position() {
        let bracket = Bracket::skeleton(3);
        let m = bracket.get(MatchPosition::new(2, 2)).unwrap();
        assert_eq!(m.position(), MatchPosition::new(2, 2));

        assert!(bracket.get(MatchPosition::new(2, 3)).is_none());
        assert!(bracket.get(MatchPosition::new(0, 1)).is_none());
        assert!(bracket.get(MatchPosition::new(4, 1)).is_none());
        assert_eq!(
            bracket.final_match().unwrap().position(),
            MatchPosition::new(3, 1)
        );
    }

    #[test]
    fn test_from_matches_reorders() {
        let mut matches = Bracket::skeleton(2).into_matches();
        matches.reverse();

        let bracket = Bracket::from_matches(matches).unwrap();
        assert_eq!(bracket.num_rounds(), 2);
        assert_eq!(bracket.matches()[0].position(), MatchPosition::new(1, 1));
    }

    #[test]
    fn test_from_matches_rejects_gaps() {
        let mut matches = Bracket::skeleton(2).into_matches();
        matches.remove(1);
        let err = Bracket::from_matches(matches).unwrap_err();
        assert!(matches!(err, BracketError::MalformedBracket(_)));

        let mut duplicated = Bracket::skeleton(2).into_matches();
        duplicated[1] = duplicated[0].clone();
        let err = Bracket::from_matches(duplicated).unwrap_err();
        assert!(matches!(err, BracketError::MalformedBracket(_)));

        let err = Bracket::from_matches(Vec::new()).unwrap_err();
        assert!(matches!(err, BracketError::MalformedBracket(_)));
    }

    #[test]
    fn test_dead_matches() {
        let mut bracket = Bracket::skeleton(3);
        bracket
            .get_mut(MatchPosition::new(1, 3))
            .unwrap()
            .player1_id = Some(5);

        assert!(!bracket.is_dead(MatchPosition::new(1, 3)));
        assert!(bracket.is_dead(MatchPosition::new(1, 4)));
        assert!(bracket.is_dead(MatchPosition::new(1, 1)));
        assert!(!bracket.is_dead(MatchPosition::new(2, 2)));
        assert_eq!(bracket.expected_entrants(MatchPosition::new(2, 2)), 1);
        assert_eq!(bracket.expected_entrants(MatchPosition::new(2, 1)), 0);
        assert_eq!(bracket.expected_entrants(MatchPosition::new(1, 3)), 1);
    }

    #[test]
    fn test_deserialize_checks_layout() {
        let bracket = Bracket::build(&[1, 2, 3]).unwrap();
        let json = serde_json::to_string(&bracket).unwrap();
        let loaded: Bracket = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, bracket);

        let first = serde_json::to_string(&bracket.matches()[0]).unwrap();
        let short = format!(r#"{{"num_rounds":3,"matches":[{first}]}}"#);
        assert!(serde_json::from_str::<Bracket>(&short).is_err());

        let matches = serde_json::to_string(bracket.matches()).unwrap();
        let mismatched = format!(r#"{{"num_rounds":5,"matches":{matches}}}"#);
        let err = serde_json::from_str::<Bracket>(&mismatched).unwrap_err();
        assert!(err.to_string().contains("header says 5"));
    }
}
