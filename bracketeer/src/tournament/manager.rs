//! Tournament manager: runs the bracket engine against a repository.

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    MatchId, MatchUpdate, NewPlayer, Tournament, TournamentData, TournamentId, TournamentSummary,
};
use crate::bracket::{
    Advancement, Bracket, BracketError, BracketMatch, IntegrityViolation, MIN_PLAYERS, PlayerId,
    verify_matches,
};
use crate::db::BracketRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tournament manager
///
/// Result recording is serialized per tournament, so two winners submitted
/// for the same tournament never race on its bracket.
#[derive(Clone)]
pub struct TournamentManager {
    repository: Arc<dyn BracketRepository>,
    locks: Arc<Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(repository: Arc<dyn BracketRepository>) -> Self {
        Self {
            repository,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn tournament_lock(&self, tournament_id: TournamentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(tournament_id).or_default().clone()
    }

    /// Create a tournament, seed its players in the given order and store
    /// the initial bracket with all byes resolved.
    ///
    /// # Arguments
    ///
    /// * `name` - Tournament name, must not be blank
    /// * `player_names` - Entrants in seeding order
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidInput` - Blank tournament or player name
    /// * `TournamentError::Bracket` - Fewer than two players
    pub async fn create_tournament(
        &self,
        name: &str,
        player_names: &[String],
    ) -> TournamentResult<TournamentData> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::InvalidInput(
                "Tournament name is required".to_string(),
            ));
        }

        let names: Vec<String> = player_names.iter().map(|n| n.trim().to_string()).collect();
        if let Some(idx) = names.iter().position(|n| n.is_empty()) {
            return Err(TournamentError::InvalidInput(format!(
                "Player {} has a blank name",
                idx + 1
            )));
        }

        if names.len() < MIN_PLAYERS {
            return Err(BracketError::Validation {
                needed: MIN_PLAYERS,
                provided: names.len(),
            }
            .into());
        }

        let tournament = self.repository.create_tournament(name).await?;

        match self.populate(&tournament, &names).await {
            Ok(data) => {
                log::info!(
                    "Created tournament {} '{}' with {} players",
                    tournament.id,
                    tournament.name,
                    names.len()
                );
                Ok(data)
            }
            Err(e) => {
                log::error!("Failed to set up tournament {}: {}", tournament.id, e);
                if let Err(cleanup) = self.repository.delete_tournament(tournament.id).await {
                    log::error!(
                        "Failed to remove partial tournament {}: {}",
                        tournament.id,
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }

    async fn populate(
        &self,
        tournament: &Tournament,
        names: &[String],
    ) -> TournamentResult<TournamentData> {
        let players = self
            .repository
            .create_players(tournament.id, &NewPlayer::seeded(names))
            .await?;

        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        let bracket = Bracket::build(&ids)?;

        for violation in bracket.verify() {
            log::warn!("Tournament {}: {}", tournament.id, violation);
        }

        let matches = self
            .repository
            .create_matches(tournament.id, bracket.matches())
            .await?;

        Ok(TournamentData {
            tournament: tournament.clone(),
            players,
            matches,
        })
    }

    /// Record the winner of a match and advance them through the bracket.
    ///
    /// All matches touched by the advancement are written together.
    ///
    /// # Errors
    ///
    /// * `TournamentError::MatchNotFound` - Unknown match ID
    /// * `TournamentError::Bracket` - The engine rejected the result; nothing was written
    pub async fn set_winner(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
    ) -> TournamentResult<Advancement> {
        let record = self
            .repository
            .get_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        let tournament_id = record.tournament_id;

        let lock = self.tournament_lock(tournament_id).await;
        let _guard = lock.lock().await;

        let records = self.repository.read_matches(tournament_id, None).await?;
        let ids: HashMap<_, MatchId> = records.iter().map(|m| (m.position(), m.id)).collect();

        let mut bracket = Bracket::from_matches(records.into_iter().map(|m| m.bracket))?;
        let advancement = bracket.record_winner(record.position(), winner_id)?;

        let updates = advancement
            .changed
            .iter()
            .map(|position| {
                let id = ids.get(position).copied();
                let m = bracket.get(*position);
                match (id, m) {
                    (Some(id), Some(m)) => Ok((id, MatchUpdate::from(m))),
                    _ => Err(TournamentError::from(BracketError::MatchNotFound(*position))),
                }
            })
            .collect::<TournamentResult<Vec<_>>>()?;

        self.repository.apply_updates(&updates).await?;

        log::info!(
            "Tournament {}: player {} won match {} ({}), {} match(es) updated",
            tournament_id,
            winner_id,
            match_id,
            record.position(),
            updates.len()
        );
        for bye in &advancement.byes_created {
            log::info!("Tournament {}: {} became a bye", tournament_id, bye);
        }

        Ok(advancement)
    }

    /// Load a tournament with its players and matches
    pub async fn get_tournament_data(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<TournamentData> {
        let tournament = self
            .repository
            .get_tournament(tournament_id)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))?;
        let players = self.repository.read_players(tournament_id).await?;
        let matches = self.repository.read_matches(tournament_id, None).await?;

        Ok(TournamentData {
            tournament,
            players,
            matches,
        })
    }

    /// List all tournaments, newest first, with progress
    pub async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentSummary>> {
        let tournaments = self.repository.list_tournaments().await?;
        let mut summaries = Vec::with_capacity(tournaments.len());

        for tournament in tournaments {
            let players = self.repository.read_players(tournament.id).await?;
            let matches = self.repository.read_matches(tournament.id, None).await?;
            summaries.push(TournamentSummary::from_data(&TournamentData {
                tournament,
                players,
                matches,
            }));
        }

        Ok(summaries)
    }

    /// Delete a tournament with its players and matches
    pub async fn delete_tournament(&self, tournament_id: TournamentId) -> TournamentResult<()> {
        let lock = self.tournament_lock(tournament_id).await;
        let _guard = lock.lock().await;

        let deleted = self.repository.delete_tournament(tournament_id).await?;

        // Drop the entry only if no other caller holds or waits on this mutex
        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&tournament_id);
        }
        drop(locks);

        if !deleted {
            return Err(TournamentError::NotFound(tournament_id));
        }
        log::info!("Deleted tournament {}", tournament_id);
        Ok(())
    }

    /// Run the integrity checks over a stored tournament
    pub async fn verify_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> TournamentResult<Vec<IntegrityViolation>> {
        if self.repository.get_tournament(tournament_id).await?.is_none() {
            return Err(TournamentError::NotFound(tournament_id));
        }

        let matches: Vec<BracketMatch> = self
            .repository
            .read_matches(tournament_id, None)
            .await?
            .into_iter()
            .map(|m| m.bracket)
            .collect();

        Ok(verify_matches(&matches))
    }
}
