//! Storage collaborator for brackets.
//!
//! The engine never talks to storage itself. [`BracketRepository`] is the
//! seam between the orchestration layer and whatever persists tournaments,
//! so the manager can run against PostgreSQL or the in-memory store.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Duration;

use super::timeouts::{DEFAULT_QUERY_TIMEOUT, with_timeout};
use crate::bracket::BracketMatch;
use crate::tournament::{
    MatchId, MatchRecord, MatchUpdate, NewPlayer, Player, Tournament, TournamentError,
    TournamentId, TournamentResult,
};

/// Persistence operations for tournaments, players and matches
#[async_trait]
pub trait BracketRepository: Send + Sync {
    /// Create an empty tournament
    async fn create_tournament(&self, name: &str) -> TournamentResult<Tournament>;

    async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// All tournaments, newest first
    async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>>;

    /// Delete a tournament with its players and matches.
    ///
    /// Returns `false` if the tournament did not exist.
    async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<bool>;

    /// Persist players and return them with their assigned IDs, in input order
    async fn create_players(
        &self,
        tournament_id: TournamentId,
        players: &[NewPlayer],
    ) -> TournamentResult<Vec<Player>>;

    /// Players ordered by seed position
    async fn read_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>>;

    /// Persist a batch of matches and return them with their assigned IDs
    async fn create_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[BracketMatch],
    ) -> TournamentResult<Vec<MatchRecord>>;

    /// Matches ordered by round then match number, optionally for one round only
    async fn read_matches(
        &self,
        tournament_id: TournamentId,
        round: Option<u32>,
    ) -> TournamentResult<Vec<MatchRecord>>;

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Option<MatchRecord>>;

    /// Overwrite the mutable fields of one match in a single write
    async fn update_match(
        &self,
        match_id: MatchId,
        update: MatchUpdate,
    ) -> TournamentResult<MatchRecord>;

    /// Write a set of match updates.
    ///
    /// The default applies them one by one; implementations that can should
    /// make the whole set atomic.
    async fn apply_updates(&self, updates: &[(MatchId, MatchUpdate)]) -> TournamentResult<()> {
        for (match_id, update) in updates {
            self.update_match(*match_id, *update).await?;
        }
        Ok(())
    }
}

const MATCH_COLUMNS: &str =
    "id, tournament_id, round_number, match_number, player1_id, player2_id, winner_id, is_bye";

/// PostgreSQL implementation of `BracketRepository`
#[derive(Clone)]
pub struct PgBracketRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgBracketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the per-query timeout
    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

fn tournament_from_row(row: &PgRow) -> Result<Tournament, sqlx::Error> {
    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row
            .try_get::<chrono::NaiveDateTime, _>("created_at")?
            .and_utc(),
    })
}

fn player_from_row(row: &PgRow) -> Result<Player, sqlx::Error> {
    Ok(Player {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        name: row.try_get("name")?,
        seed_position: row.try_get::<i32, _>("seed_position")? as u32,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchRecord, sqlx::Error> {
    Ok(MatchRecord {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        bracket: BracketMatch {
            round_number: row.try_get::<i32, _>("round_number")? as u32,
            match_number: row.try_get::<i32, _>("match_number")? as u32,
            player1_id: row.try_get("player1_id")?,
            player2_id: row.try_get("player2_id")?,
            winner_id: row.try_get("winner_id")?,
            is_bye: row.try_get("is_bye")?,
        },
    })
}

#[async_trait]
impl BracketRepository for PgBracketRepository {
    async fn create_tournament(&self, name: &str) -> TournamentResult<Tournament> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("INSERT INTO tournaments (name) VALUES ($1) RETURNING id, name, created_at")
                .bind(name)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(tournament_from_row(&row)?)
    }

    async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query("SELECT id, name, created_at FROM tournaments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn list_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, name, created_at FROM tournaments ORDER BY created_at DESC, id DESC",
            )
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .iter()
            .map(tournament_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn delete_tournament(&self, id: TournamentId) -> TournamentResult<bool> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM tournaments WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_players(
        &self,
        tournament_id: TournamentId,
        players: &[NewPlayer],
    ) -> TournamentResult<Vec<Player>> {
        let mut tx = with_timeout(self.query_timeout, self.pool.begin()).await?;
        let mut created = Vec::with_capacity(players.len());

        for player in players {
            let row = with_timeout(
                self.query_timeout,
                sqlx::query(
                    "INSERT INTO players (tournament_id, name, seed_position) VALUES ($1, $2, $3)
                     RETURNING id, tournament_id, name, seed_position",
                )
                .bind(tournament_id)
                .bind(&player.name)
                .bind(player.seed_position as i32)
                .fetch_one(&mut *tx),
            )
            .await?;
            created.push(player_from_row(&row)?);
        }

        with_timeout(self.query_timeout, tx.commit()).await?;
        Ok(created)
    }

    async fn read_players(&self, tournament_id: TournamentId) -> TournamentResult<Vec<Player>> {
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, tournament_id, name, seed_position FROM players
                 WHERE tournament_id = $1 ORDER BY seed_position, id",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(player_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[BracketMatch],
    ) -> TournamentResult<Vec<MatchRecord>> {
        let mut tx = with_timeout(self.query_timeout, self.pool.begin()).await?;
        let mut created = Vec::with_capacity(matches.len());
        let sql = format!(
            "INSERT INTO matches
                (tournament_id, round_number, match_number, player1_id, player2_id, winner_id, is_bye)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {MATCH_COLUMNS}"
        );

        for m in matches {
            let row = with_timeout(
                self.query_timeout,
                sqlx::query(&sql)
                    .bind(tournament_id)
                    .bind(m.round_number as i32)
                    .bind(m.match_number as i32)
                    .bind(m.player1_id)
                    .bind(m.player2_id)
                    .bind(m.winner_id)
                    .bind(m.is_bye)
                    .fetch_one(&mut *tx),
            )
            .await?;
            created.push(match_from_row(&row)?);
        }

        with_timeout(self.query_timeout, tx.commit()).await?;
        log::debug!(
            "Stored {} matches for tournament {}",
            created.len(),
            tournament_id
        );
        Ok(created)
    }

    async fn read_matches(
        &self,
        tournament_id: TournamentId,
        round: Option<u32>,
    ) -> TournamentResult<Vec<MatchRecord>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE tournament_id = $1 AND ($2::INTEGER IS NULL OR round_number = $2)
             ORDER BY round_number, match_number"
        );
        let rows = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(tournament_id)
                .bind(round.map(|r| r as i32))
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(match_from_row).collect::<Result<_, _>>()?)
    }

    async fn get_match(&self, match_id: MatchId) -> TournamentResult<Option<MatchRecord>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql).bind(match_id).fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn update_match(
        &self,
        match_id: MatchId,
        update: MatchUpdate,
    ) -> TournamentResult<MatchRecord> {
        let sql = format!(
            "UPDATE matches SET player1_id = $2, player2_id = $3, winner_id = $4, is_bye = $5
             WHERE id = $1 RETURNING {MATCH_COLUMNS}"
        );
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(match_id)
                .bind(update.player1_id)
                .bind(update.player2_id)
                .bind(update.winner_id)
                .bind(update.is_bye)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(TournamentError::MatchNotFound(match_id))?;

        Ok(match_from_row(&row)?)
    }

    async fn apply_updates(&self, updates: &[(MatchId, MatchUpdate)]) -> TournamentResult<()> {
        let mut tx = with_timeout(self.query_timeout, self.pool.begin()).await?;

        for (match_id, update) in updates {
            let result = with_timeout(
                self.query_timeout,
                sqlx::query(
                    "UPDATE matches SET player1_id = $2, player2_id = $3, winner_id = $4, is_bye = $5
                     WHERE id = $1",
                )
                .bind(*match_id)
                .bind(update.player1_id)
                .bind(update.player2_id)
                .bind(update.winner_id)
                .bind(update.is_bye)
                .execute(&mut *tx),
            )
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the earlier updates
                return Err(TournamentError::MatchNotFound(*match_id));
            }
        }

        with_timeout(self.query_timeout, tx.commit()).await?;
        Ok(())
    }
}
