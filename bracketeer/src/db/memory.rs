//! In-memory `BracketRepository`.
//!
//! Keeps everything in mutex-guarded maps. Used by tests and as an
//! ephemeral store when no database is configured.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::repository::BracketRepository;
use crate::bracket::BracketMatch;
use crate::tournament::{
    MatchId, MatchRecord, MatchUpdate, NewPlayer, Player, Tournament, TournamentError,
    TournamentId, TournamentResult,
};

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    tournaments: BTreeMap<TournamentId, Tournament>,
    players: BTreeMap<i64, Player>,
    matches: BTreeMap<MatchId, MatchRecord>,
}

impl Store {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_tournament(&self, id: TournamentId) -> TournamentResult<()> {
        if self.tournaments.contains_key(&id) {
            Ok(())
        } else {
            Err(TournamentError::NotFound(id))
        }
    }
}

/// Mutex-guarded in-memory store
#[derive(Debug, Default)]
pub struct MemoryBracketRepository {
    store: Mutex<Store>,
}

impl MemoryBracketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> TournamentResult<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| TournamentError::Storage("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BracketRepository for MemoryBracketRepository {
    async fn create_tournament(&self, name: &str) -> TournamentResult<Tournament> {
        let mut store = self.lock()?;
        let tournament = Tournament {
            id: store.allocate_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        store.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.lock()?.tournaments.get(&id).cloned())
    }

    async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        let store = self.lock()?;
        let mut tournaments: Vec<Tournament> = store.tournaments.values().cloned().collect();
        tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tournaments)
    }

    async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<bool> {
        let mut store = self.lock()?;
        if store.tournaments.remove(&id).is_none() {
            return Ok(false);
        }
        store.players.retain(|_, p| p.tournament_id != id);
        store.matches.retain(|_, m| m.tournament_id != id);
        Ok(true)
    }

    async fn create_players(
        &self,
        tournament_id: TournamentId,
        players: &[NewPlayer],
    ) -> TournamentResult<Vec<Player>> {
        let mut store = self.lock()?;
        store.require_tournament(tournament_id)?;

        let created: Vec<Player> = players
            .iter()
            .map(|p| Player {
                id: store.allocate_id(),
                tournament_id,
                name: p.name.clone(),
                seed_position: p.seed_position,
            })
            .collect();
        for player in &created {
            store.players.insert(player.id, player.clone());
        }
        Ok(created)
    }

    async fn read_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>> {
        let store = self.lock()?;
        let mut players: Vec<Player> = store
            .players
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| (p.seed_position, p.id));
        Ok(players)
    }

    async fn create_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[BracketMatch],
    ) -> TournamentResult<Vec<MatchRecord>> {
        let mut store = self.lock()?;
        store.require_tournament(tournament_id)?;

        let taken = matches.iter().any(|m| {
            store
                .matches
                .values()
                .any(|r| r.tournament_id == tournament_id && r.position() == m.position())
        });
        if taken {
            return Err(TournamentError::Storage(format!(
                "tournament {tournament_id} already has a match at one of these positions"
            )));
        }

        let created: Vec<MatchRecord> = matches
            .iter()
            .map(|m| MatchRecord {
                id: store.allocate_id(),
                tournament_id,
                bracket: m.clone(),
            })
            .collect();
        for record in &created {
            store.matches.insert(record.id, record.clone());
        }
        Ok(created)
    }

    async fn read_matches(
        &self,
        tournament_id: TournamentId,
        round: Option<u32>,
    ) -> TournamentResult<Vec<MatchRecord>> {
        let store = self.lock()?;
        let mut matches: Vec<MatchRecord> = store
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .filter(|m| round.is_none_or(|r| m.bracket.round_number == r))
            .cloned()
            .collect();
        matches.sort_by_key(MatchRecord::position);
        Ok(matches)
    }

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Option<MatchRecord>> {
        Ok(self.lock()?.matches.get(&match_id).cloned())
    }

    async fn update_match(
        &self,
        match_id: MatchId,
        update: MatchUpdate,
    ) -> TournamentResult<MatchRecord> {
        let mut store = self.lock()?;
        let record = store
            .matches
            .get_mut(&match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        record.apply(&update);
        Ok(record.clone())
    }

    /// All-or-nothing: every ID is checked before anything is written
    async fn apply_updates(&self, updates: &[(MatchId, MatchUpdate)]) -> TournamentResult<()> {
        let mut store = self.lock()?;
        if let Some((missing, _)) = updates
            .iter()
            .find(|(id, _)| !store.matches.contains_key(id))
        {
            return Err(TournamentError::MatchNotFound(*missing));
        }

        for (match_id, update) in updates {
            if let Some(record) = store.matches.get_mut(match_id) {
                record.apply(update);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{Bracket, MatchPosition};

    async fn seeded(repo: &MemoryBracketRepository, n: usize) -> (Tournament, Vec<Player>) {
        let tournament = repo.create_tournament("Test Cup").await.unwrap();
        let names: Vec<String> = (1..=n).map(|i| format!("Player {i}")).collect();
        let players = repo
            .create_players(tournament.id, &NewPlayer::seeded(&names))
            .await
            .unwrap();
        (tournament, players)
    }

    #[tokio::test]
    async fn test_create_and_read_players() {
        let repo = MemoryBracketRepository::new();
        let (tournament, players) = seeded(&repo, 3).await;

        assert_eq!(players.len(), 3);
        assert!(players.iter().all(|p| p.tournament_id == tournament.id));

        let read = repo.read_players(tournament.id).await.unwrap();
        assert_eq!(read, players);
        assert_eq!(read[2].seed_position, 3);
    }

    #[tokio::test]
    async fn test_players_require_tournament() {
        let repo = MemoryBracketRepository::new();
        let result = repo
            .create_players(42, &NewPlayer::seeded(&["Solo".to_string()]))
            .await;
        assert!(matches!(result, Err(TournamentError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_matches_filtered_and_ordered() {
        let repo = MemoryBracketRepository::new();
        let (tournament, players) = seeded(&repo, 5).await;
        let ids: Vec<i64> = players.iter().map(|p| p.id).collect();
        let bracket = Bracket::build(&ids).unwrap();

        // Store in reverse to check ordering on read
        let mut reversed = bracket.matches().to_vec();
        reversed.reverse();
        repo.create_matches(tournament.id, &reversed).await.unwrap();

        let all = repo.read_matches(tournament.id, None).await.unwrap();
        assert_eq!(all.len(), 7);
        let positions: Vec<MatchPosition> = all.iter().map(MatchRecord::position).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);

        let round_two = repo.read_matches(tournament.id, Some(2)).await.unwrap();
        assert_eq!(round_two.len(), 2);
        assert!(round_two.iter().all(|m| m.bracket.round_number == 2));
    }

    #[tokio::test]
    async fn test_duplicate_positions_rejected() {
        let repo = MemoryBracketRepository::new();
        let (tournament, players) = seeded(&repo, 2).await;
        let bracket = Bracket::build(&[players[0].id, players[1].id]).unwrap();

        repo.create_matches(tournament.id, bracket.matches())
            .await
            .unwrap();
        let again = repo.create_matches(tournament.id, bracket.matches()).await;
        assert!(matches!(again, Err(TournamentError::Storage(_))));
    }

    #[tokio::test]
    async fn test_update_match() {
        let repo = MemoryBracketRepository::new();
        let (tournament, players) = seeded(&repo, 2).await;
        let bracket = Bracket::build(&[players[0].id, players[1].id]).unwrap();
        let stored = repo
            .create_matches(tournament.id, bracket.matches())
            .await
            .unwrap();

        let mut decided = stored[0].bracket.clone();
        decided.winner_id = Some(players[1].id);
        let updated = repo
            .update_match(stored[0].id, MatchUpdate::from(&decided))
            .await
            .unwrap();
        assert_eq!(updated.bracket, decided);
        assert_eq!(
            repo.get_match(stored[0].id).await.unwrap(),
            Some(updated.clone())
        );

        let missing = repo.update_match(999, MatchUpdate::from(&decided)).await;
        assert!(matches!(missing, Err(TournamentError::MatchNotFound(999))));
    }

    #[tokio::test]
    async fn test_apply_updates_all_or_nothing() {
        let repo = MemoryBracketRepository::new();
        let (tournament, players) = seeded(&repo, 2).await;
        let bracket = Bracket::build(&[players[0].id, players[1].id]).unwrap();
        let stored = repo
            .create_matches(tournament.id, bracket.matches())
            .await
            .unwrap();

        let mut decided = stored[0].bracket.clone();
        decided.winner_id = Some(players[0].id);
        let update = MatchUpdate::from(&decided);

        let result = repo
            .apply_updates(&[(stored[0].id, update), (12345, update)])
            .await;
        assert!(matches!(result, Err(TournamentError::MatchNotFound(12345))));

        let unchanged = repo.get_match(stored[0].id).await.unwrap().unwrap();
        assert_eq!(unchanged.bracket.winner_id, None);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let repo = MemoryBracketRepository::new();
        let (tournament, players) = seeded(&repo, 2).await;
        let (other, _) = seeded(&repo, 2).await;
        let bracket = Bracket::build(&[players[0].id, players[1].id]).unwrap();
        repo.create_matches(tournament.id, bracket.matches())
            .await
            .unwrap();

        assert!(repo.delete_tournament(tournament.id).await.unwrap());
        assert!(!repo.delete_tournament(tournament.id).await.unwrap());
        assert!(repo.get_tournament(tournament.id).await.unwrap().is_none());
        assert!(repo.read_players(tournament.id).await.unwrap().is_empty());
        assert!(
            repo.read_matches(tournament.id, None)
                .await
                .unwrap()
                .is_empty()
        );

        assert_eq!(repo.read_players(other.id).await.unwrap().len(), 2);
        assert_eq!(repo.list_tournaments().await.unwrap(), vec![other]);
    }
}
