/// Property-based tests for the bracket engine using proptest
///
/// These tests build brackets for many player counts and play them out in
/// random orders, checking structure and integrity along the way.
use bracketeer::bracket::{
    Bracket, BracketError, BracketMatch, MatchPosition, MatchStatus, PlayerId,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn players(n: usize) -> Vec<PlayerId> {
    (1..=n as i64).map(|i| i * 10).collect()
}

// Winner rule that ignores slot order: lower or higher ID by a coin flip
fn pick_winner(m: &BracketMatch, take_higher: bool) -> PlayerId {
    let (Some(a), Some(b)) = (m.player1_id, m.player2_id) else {
        panic!("match {} is not ready", m.position());
    };
    if take_higher { a.max(b) } else { a.min(b) }
}

/// Decide every ready match of `round`, visiting them in the order given by `keys`
fn play_round(bracket: &mut Bracket, round: u32, keys: &[u64], flips: &[bool]) {
    let mut ready: Vec<MatchPosition> = bracket
        .round(round)
        .iter()
        .filter(|m| m.is_ready())
        .map(BracketMatch::position)
        .collect();
    ready.sort_by_key(|p| (keys[p.number as usize % keys.len()], p.number));

    for position in ready {
        let m = bracket.get(position).unwrap().clone();
        let winner = pick_winner(&m, flips[position.number as usize % flips.len()]);
        bracket.record_winner(position, winner).unwrap();
    }
}

/// Per-match participant sets, which do not depend on arrival order
fn round_state(bracket: &Bracket, round: u32) -> Vec<(BTreeSet<PlayerId>, Option<PlayerId>, bool)> {
    bracket
        .round(round)
        .iter()
        .map(|m| {
            let entrants = [m.player1_id, m.player2_id].into_iter().flatten().collect();
            (entrants, m.winner_id, m.is_bye)
        })
        .collect()
}

proptest! {
    #[test]
    fn test_shape_for_any_player_count(n in 2usize..=1024) {
        let bracket = Bracket::build(&players(n)).unwrap();
        let slots = n.next_power_of_two();

        prop_assert_eq!(bracket.num_rounds(), slots.trailing_zeros());
        prop_assert_eq!(bracket.matches().len(), slots - 1);
        for round in 1..=bracket.num_rounds() {
            prop_assert_eq!(bracket.round(round).len(), slots >> round);
        }
    }

    #[test]
    fn test_every_player_seeded_once(n in 2usize..=256) {
        let ids = players(n);
        let bracket = Bracket::build(&ids).unwrap();

        let seeded: Vec<PlayerId> = bracket
            .round(1)
            .iter()
            .flat_map(|m| [m.player1_id, m.player2_id])
            .flatten()
            .collect();
        prop_assert_eq!(seeded, ids);
    }

    #[test]
    fn test_fresh_bracket_passes_verification(n in 2usize..=256) {
        let bracket = Bracket::build(&players(n)).unwrap();
        prop_assert!(bracket.verify().is_empty());
    }

    #[test]
    fn test_random_playthrough_crowns_champion(
        n in 2usize..=64,
        keys in prop::collection::vec(any::<u64>(), 1..32),
        flips in prop::collection::vec(any::<bool>(), 1..32),
    ) {
        let mut bracket = Bracket::build(&players(n)).unwrap();
        let mut step = 0usize;
        let mut champion = None;

        loop {
            let ready: Vec<MatchPosition> =
                bracket.ready_matches().map(BracketMatch::position).collect();
            if ready.is_empty() {
                break;
            }

            let position = ready[keys[step % keys.len()] as usize % ready.len()];
            let m = bracket.get(position).unwrap().clone();
            let winner = pick_winner(&m, flips[step % flips.len()]);
            let outcome = bracket.record_winner(position, winner).unwrap();

            // Every intermediate state is consistent
            prop_assert!(bracket.verify().is_empty(), "after deciding {}", position);
            prop_assert_eq!(outcome.changed.first(), Some(&position));
            if outcome.champion.is_some() {
                champion = outcome.champion;
            }
            step += 1;
        }

        prop_assert!(bracket.is_complete());
        prop_assert_eq!(bracket.champion(), champion);
        prop_assert!(champion.is_some());
        // One result per real match: n players need n - 1 eliminations
        prop_assert_eq!(step, n - 1);
    }

    #[test]
    fn test_round_order_does_not_change_next_round(
        n in 2usize..=64,
        keys_a in prop::collection::vec(any::<u64>(), 1..16),
        keys_b in prop::collection::vec(any::<u64>(), 1..16),
        flips in prop::collection::vec(any::<bool>(), 1..16),
    ) {
        let mut first = Bracket::build(&players(n)).unwrap();
        let mut second = first.clone();

        for round in 1..first.num_rounds() {
            play_round(&mut first, round, &keys_a, &flips);
            play_round(&mut second, round, &keys_b, &flips);

            prop_assert_eq!(round_state(&first, round + 1), round_state(&second, round + 1));

            // Every live match of the next round is now full or a bye
            for m in first.round(round + 1) {
                if !first.is_dead(m.position()) {
                    prop_assert!(
                        m.status() == MatchStatus::Ready || m.is_bye,
                        "{} is {}", m.position(), m.status()
                    );
                }
            }
        }
    }

    #[test]
    fn test_verification_is_repeatable(
        n in 2usize..=64,
        corrupt in 0usize..64,
        bogus in 1000i64..2000,
    ) {
        let mut matches = Bracket::build(&players(n)).unwrap().into_matches();
        let idx = corrupt % matches.len();
        matches[idx].winner_id = Some(bogus);

        let first = bracketeer::bracket::verify_matches(&matches);
        let second = bracketeer::bracket::verify_matches(&matches);
        prop_assert!(!first.is_empty());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_winner_changes_nothing(n in 2usize..=64, outsider in 5000i64..6000) {
        let mut bracket = Bracket::build(&players(n)).unwrap();
        let before = bracket.clone();
        let position = bracket.ready_matches().next().unwrap().position();

        let result = bracket.record_winner(position, outsider);
        prop_assert_eq!(
            result,
            Err(BracketError::InvalidWinner { position, winner: outsider })
        );
        prop_assert_eq!(bracket, before);
    }
}

#[test]
fn test_eight_players_have_no_byes() {
    let bracket = Bracket::build(&players(8)).unwrap();
    assert_eq!(bracket.num_rounds(), 3);
    assert_eq!(bracket.round(1).len(), 4);
    assert_eq!(bracket.round(2).len(), 2);
    assert_eq!(bracket.round(3).len(), 1);
    assert!(bracket.matches().iter().all(|m| !m.is_bye));
}

#[test]
fn test_five_players_bye_waits_for_live_match() {
    let mut bracket = Bracket::build(&players(5)).unwrap();
    assert_eq!(bracket.total_slots(), 8);
    assert_eq!(bracket.num_rounds(), 3);

    let bye = bracket.get(MatchPosition::new(1, 3)).unwrap();
    assert!(bye.is_bye);
    assert_eq!(bye.winner_id, Some(50));

    // The bye winner is already in place for round 2
    let r2m2 = bracket.get(MatchPosition::new(2, 2)).unwrap();
    assert!(r2m2.has_participant(50));

    // Round 2's first match still waits on two live matches
    let r2m1 = bracket.get(MatchPosition::new(2, 1)).unwrap();
    assert_eq!(r2m1.status(), MatchStatus::Waiting);
    assert!(!r2m1.is_bye);

    bracket.record_winner(MatchPosition::new(1, 1), 10).unwrap();
    let r2m1 = bracket.get(MatchPosition::new(2, 1)).unwrap();
    assert_eq!(r2m1.player1_id, Some(10));
    assert!(!r2m1.is_bye);

    bracket.record_winner(MatchPosition::new(1, 2), 40).unwrap();
    let r2m1 = bracket.get(MatchPosition::new(2, 1)).unwrap();
    assert_eq!(r2m1.status(), MatchStatus::Ready);
    assert!(bracket.verify().is_empty());
}

#[test]
fn test_three_players_final_waits_in_slot_two() {
    let mut bracket = Bracket::build(&players(3)).unwrap();
    assert_eq!(bracket.round(1).len(), 2);
    assert_eq!(bracket.round(2).len(), 1);

    let final_match = bracket.final_match().unwrap();
    assert_eq!(final_match.player1_id, Some(30));
    assert_eq!(final_match.player2_id, None);

    bracket.record_winner(MatchPosition::new(1, 1), 20).unwrap();
    let final_match = bracket.final_match().unwrap();
    assert_eq!(final_match.player2_id, Some(20));
    assert_eq!(final_match.status(), MatchStatus::Ready);
}

#[test]
fn test_final_result_crowns_champion() {
    let mut bracket = Bracket::build(&players(2)).unwrap();
    let outcome = bracket.record_winner(MatchPosition::new(1, 1), 20).unwrap();

    assert_eq!(outcome.champion, Some(20));
    assert_eq!(outcome.changed, vec![MatchPosition::new(1, 1)]);
    assert!(outcome.byes_created.is_empty());
    assert_eq!(bracket.champion(), Some(20));

    // A decided final cannot be decided again
    let again = bracket.record_winner(MatchPosition::new(1, 1), 10);
    assert!(matches!(again, Err(BracketError::MatchNotReady { .. })));
}

#[test]
fn test_too_few_players() {
    for n in 0..2 {
        assert_eq!(
            Bracket::build(&players(n)),
            Err(BracketError::Validation {
                needed: 2,
                provided: n
            })
        );
    }
}
