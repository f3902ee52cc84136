//! Read-only integrity checks over the match set of one tournament.

use super::models::{BracketMatch, MatchPosition, PlayerId};
use super::tree::{Bracket, MAX_ROUNDS, expected_entrants_in, is_stranded_in};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// A single inconsistency found by the verifier.
///
/// Findings about a whole round use `match_number = 0`; findings about the
/// whole bracket use `round = 0` as well.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("round {round}, match {match_number}: {kind}")]
pub struct IntegrityViolation {
    pub round: u32,
    pub match_number: u32,
    pub kind: ViolationKind,
}

impl IntegrityViolation {
    pub fn new(position: MatchPosition, kind: ViolationKind) -> Self {
        Self {
            round: position.round,
            match_number: position.number,
            kind,
        }
    }

    fn round(round: u32, kind: ViolationKind) -> Self {
        Self {
            round,
            match_number: 0,
            kind,
        }
    }

    fn bracket(kind: ViolationKind) -> Self {
        Self::round(0, kind)
    }
}

/// Kinds of integrity findings
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ViolationKind {
    #[error("no matches")]
    NoMatches,

    #[error("bracket has {actual} matches, expected {expected}")]
    TotalMatches { expected: usize, actual: usize },

    #[error("round has {actual} matches, expected {expected}")]
    RoundSize { expected: usize, actual: usize },

    #[error("match number appears more than once")]
    DuplicateMatch,

    #[error("bye has no winner")]
    ByeWithoutWinner,

    #[error("bye must hold a single player in slot 1 who is also the winner")]
    MalformedBye,

    #[error("winner {winner} is not a participant")]
    WinnerNotParticipant { winner: PlayerId },

    #[error("winner {winner} recorded before both players were known")]
    PrematureWinner { winner: PlayerId },

    #[error("winner {winner} is missing from {target}")]
    WinnerNotAdvanced {
        winner: PlayerId,
        target: MatchPosition,
    },

    #[error("player {player} appears more than once")]
    DuplicateEntrant { player: PlayerId },

    #[error("holds {present} of {expected} players but no feeder can supply more")]
    StrandedMatch { expected: usize, present: usize },

    #[error("position lies outside a bracket of {num_rounds} rounds")]
    OutOfShape { num_rounds: u32 },
}

impl Bracket {
    /// Check this bracket's invariants, see [`verify_matches`]
    pub fn verify(&self) -> Vec<IntegrityViolation> {
        verify_matches(self.matches())
    }
}

/// Check a tournament's matches for structural and advancement errors.
///
/// Accepts matches in any order, including sets that would not load as a
/// [`Bracket`]. Findings are returned in bracket order and the same input
/// always yields the same findings.
///
/// The bracket spans as many rounds as the highest round found, up to
/// [`MAX_ROUNDS`]. Matches that do not fit that shape are reported as
/// [`ViolationKind::OutOfShape`] and get no further checks.
pub fn verify_matches(matches: &[BracketMatch]) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    if matches.is_empty() {
        violations.push(IntegrityViolation::bracket(ViolationKind::NoMatches));
        return violations;
    }

    let num_rounds = matches
        .iter()
        .map(|m| m.round_number)
        .filter(|round| (1..=MAX_ROUNDS).contains(round))
        .max()
        .unwrap_or(0);
    let in_shape = |position: MatchPosition| {
        (1..=num_rounds).contains(&position.round)
            && position.number >= 1
            && position.number <= 1u32 << (num_rounds - position.round)
    };

    let mut by_position: BTreeMap<MatchPosition, &BracketMatch> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for m in matches {
        if by_position.insert(m.position(), m).is_some() {
            duplicates.push(m.position());
        }
    }
    duplicates.sort();
    duplicates.dedup();

    let expected_total = (1usize << num_rounds) - 1;
    if matches.len() != expected_total {
        violations.push(IntegrityViolation::bracket(ViolationKind::TotalMatches {
            expected: expected_total,
            actual: matches.len(),
        }));
    }

    for round in 1..=num_rounds {
        let expected = 1usize << (num_rounds - round);
        let actual = matches.iter().filter(|m| m.round_number == round).count();
        if actual != expected {
            violations.push(IntegrityViolation::round(
                round,
                ViolationKind::RoundSize { expected, actual },
            ));
        }
    }

    for position in duplicates {
        violations.push(IntegrityViolation::new(position, ViolationKind::DuplicateMatch));
    }

    let lookup = |position: MatchPosition| by_position.get(&position).copied();
    let mut seeded: HashSet<PlayerId> = HashSet::new();

    for (&position, m) in &by_position {
        let mut report = |kind| violations.push(IntegrityViolation::new(position, kind));

        if !in_shape(position) {
            report(ViolationKind::OutOfShape { num_rounds });
            continue;
        }

        if m.is_bye {
            match m.winner_id {
                None => report(ViolationKind::ByeWithoutWinner),
                Some(winner) => {
                    if m.player1_id != Some(winner) || m.player2_id.is_some() {
                        report(ViolationKind::MalformedBye);
                    }
                }
            }
        } else if let Some(winner) = m.winner_id {
            if !m.has_participant(winner) {
                report(ViolationKind::WinnerNotParticipant { winner });
            } else if m.occupants() < 2 {
                report(ViolationKind::PrematureWinner { winner });
            }
        }

        if let (Some(p1), Some(p2)) = (m.player1_id, m.player2_id) {
            if p1 == p2 {
                report(ViolationKind::DuplicateEntrant { player: p1 });
            }
        }

        if position.round == 1 {
            for player in [m.player1_id, m.player2_id].into_iter().flatten() {
                if !seeded.insert(player) {
                    report(ViolationKind::DuplicateEntrant { player });
                }
            }
        }

        if let Some(winner) = m.winner_id {
            if position.round < num_rounds {
                let target = position.next();
                let advanced = lookup(target).is_some_and(|t| t.has_participant(winner));
                if !advanced {
                    report(ViolationKind::WinnerNotAdvanced { winner, target });
                }
            }
        }

        if is_stranded_in(&lookup, m) {
            report(ViolationKind::StrandedMatch {
                expected: expected_entrants_in(&lookup, position),
                present: m.occupants(),
            });
        }
    }

    if !violations.is_empty() {
        log::warn!("Bracket verification found {} issue(s)", violations.len());
    }

    violations
}
