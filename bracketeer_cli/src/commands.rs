//! Command parsing, execution and plain-text rendering.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use bracketeer::bracket::{Advancement, MatchStatus, round_name};
use bracketeer::tournament::{
    MatchId, TournamentData, TournamentId, TournamentManager, TournamentSummary,
    parse_player_list, shuffle_players,
};
use bracketeer::{IntegrityViolation, PlayerId};
use pico_args::Arguments;
use thiserror::Error;

use crate::logging::log_database_operation;

/// Command-line usage errors
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("No command given, see --help")]
    MissingCommand,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unexpected arguments: {0:?}")]
    UnexpectedArguments(Vec<OsString>),

    #[error(transparent)]
    Arguments(#[from] pico_args::Error),
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        name: String,
        players: PathBuf,
        randomize: bool,
    },
    List,
    Show {
        tournament_id: TournamentId,
        json: bool,
    },
    Winner {
        match_id: MatchId,
        player_id: PlayerId,
    },
    Verify {
        tournament_id: TournamentId,
    },
    Delete {
        tournament_id: TournamentId,
    },
    Migrate,
}

impl Command {
    /// Parse the subcommand and its arguments, rejecting leftovers
    pub fn parse(pargs: &mut Arguments) -> Result<Self, UsageError> {
        let name = pargs.subcommand()?.ok_or(UsageError::MissingCommand)?;

        let command = match name.as_str() {
            "create" => Command::Create {
                randomize: pargs.contains("--randomize"),
                name: pargs.value_from_str("--name")?,
                players: pargs.value_from_str("--players")?,
            },
            "list" => Command::List,
            "show" => Command::Show {
                json: pargs.contains("--json"),
                tournament_id: pargs.free_from_str()?,
            },
            "winner" => Command::Winner {
                match_id: pargs.free_from_str()?,
                player_id: pargs.free_from_str()?,
            },
            "verify" => Command::Verify {
                tournament_id: pargs.free_from_str()?,
            },
            "delete" => Command::Delete {
                tournament_id: pargs.free_from_str()?,
            },
            "migrate" => Command::Migrate,
            other => return Err(UsageError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::List => "list",
            Command::Show { .. } => "show",
            Command::Winner { .. } => "winner",
            Command::Verify { .. } => "verify",
            Command::Delete { .. } => "delete",
            Command::Migrate => "migrate",
        }
    }
}

/// Reject anything the command did not consume
pub fn finish(pargs: Arguments) -> Result<(), UsageError> {
    let remaining = pargs.finish();
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(UsageError::UnexpectedArguments(remaining))
    }
}

async fn timed<T, F>(operation: &str, tournament_id: Option<TournamentId>, future: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let result = future.await;
    log_database_operation(
        operation,
        tournament_id,
        start.elapsed().as_millis() as u64,
    );
    result
}

/// Outcome of running a command
pub struct Output {
    pub text: String,
    /// Exit with a failure status after printing
    pub failed: bool,
}

impl Output {
    fn ok(text: String) -> Self {
        Self {
            text,
            failed: false,
        }
    }
}

/// Run a tournament command against the manager
///
/// `Migrate` is handled by the caller since it needs the database itself.
pub async fn run(
    command: Command,
    manager: &TournamentManager,
    randomize_default: bool,
) -> anyhow::Result<Output> {
    match command {
        Command::Create {
            name,
            players,
            randomize,
        } => {
            let raw = tokio::fs::read_to_string(&players)
                .await
                .with_context(|| format!("Failed to read player list {}", players.display()))?;
            let mut names = parse_player_list(&raw);
            if randomize || randomize_default {
                shuffle_players(&mut names);
            }

            let data = timed(
                "create_tournament",
                None,
                manager.create_tournament(&name, &names),
            )
            .await?;
            Ok(Output::ok(render_tournament(&data)))
        }
        Command::List => {
            let summaries = timed("list_tournaments", None, manager.list_tournaments()).await?;
            Ok(Output::ok(render_summaries(&summaries)))
        }
        Command::Show {
            tournament_id,
            json,
        } => {
            let data = timed(
                "get_tournament_data",
                Some(tournament_id),
                manager.get_tournament_data(tournament_id),
            )
            .await?;
            let text = if json {
                serde_json::to_string_pretty(&data)?
            } else {
                render_tournament(&data)
            };
            Ok(Output::ok(text))
        }
        Command::Winner {
            match_id,
            player_id,
        } => {
            let advancement = timed("set_winner", None, manager.set_winner(match_id, player_id))
                .await?;
            Ok(Output::ok(render_advancement(&advancement)))
        }
        Command::Verify { tournament_id } => {
            let violations = timed(
                "verify_tournament",
                Some(tournament_id),
                manager.verify_tournament(tournament_id),
            )
            .await?;
            Ok(Output {
                failed: !violations.is_empty(),
                text: render_violations(tournament_id, &violations),
            })
        }
        Command::Delete { tournament_id } => {
            timed(
                "delete_tournament",
                Some(tournament_id),
                manager.delete_tournament(tournament_id),
            )
            .await?;
            Ok(Output::ok(format!("Deleted tournament {tournament_id}\n")))
        }
        Command::Migrate => Ok(Output::ok(String::new())),
    }
}

/// Bracket overview grouped by round
pub fn render_tournament(data: &TournamentData) -> String {
    let mut out = String::new();
    let t = &data.tournament;
    let _ = writeln!(
        out,
        "{} (#{}), {} players, created {}",
        t.name,
        t.id,
        data.players.len(),
        t.created_at.format("%Y-%m-%d %H:%M")
    );

    let bracket = data.bracket().ok();
    if let Some(bracket) = &bracket {
        let (done, total) = bracket
            .round_progress()
            .iter()
            .fold((0, 0), |(d, t), p| (d + p.completed, t + p.total));
        let _ = writeln!(out, "Progress: {done}/{total} matches decided");
    }
    if let Some(champion) = data.champion() {
        let _ = writeln!(out, "Champion: {}", champion.name);
    }

    let _ = writeln!(out, "\nPlayers:");
    for p in &data.players {
        let _ = writeln!(out, "  [{}] {} (seed {})", p.id, p.name, p.seed_position);
    }

    let num_rounds = data
        .matches
        .iter()
        .map(|m| m.bracket.round_number)
        .max()
        .unwrap_or(0);
    for round in 1..=num_rounds {
        let _ = writeln!(out, "\n{}:", round_name(round, num_rounds));
        for record in data.matches.iter().filter(|m| m.bracket.round_number == round) {
            let m = &record.bracket;
            let dead = bracket
                .as_ref()
                .is_some_and(|b| b.is_dead(record.position()));
            let status = if dead {
                "not played".to_string()
            } else {
                match (m.status(), m.winner_id) {
                    (MatchStatus::Bye, _) => "bye".to_string(),
                    (MatchStatus::Completed, Some(w)) => {
                        format!("winner: {}", data.display_name(Some(w)))
                    }
                    (status, _) => status.to_string(),
                }
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} vs {}  ({})",
                record.id,
                record.position(),
                data.display_name(m.player1_id),
                data.display_name(m.player2_id),
                status
            );
        }
    }

    out
}

pub fn render_summaries(summaries: &[TournamentSummary]) -> String {
    if summaries.is_empty() {
        return "No tournaments yet\n".to_string();
    }

    let mut out = String::new();
    for s in summaries {
        let _ = write!(
            out,
            "#{} {} ({} players, {}/{} matches)",
            s.tournament.id, s.tournament.name, s.player_count, s.completed_matches, s.total_matches
        );
        match &s.champion {
            Some(name) => {
                let _ = writeln!(out, " champion: {name}");
            }
            None => out.push('\n'),
        }
    }
    out
}

pub fn render_advancement(advancement: &Advancement) -> String {
    let mut out = String::new();
    let changed: Vec<String> = advancement.changed.iter().map(|p| p.to_string()).collect();
    let _ = writeln!(out, "Updated matches: {}", changed.join(", "));
    for bye in &advancement.byes_created {
        let _ = writeln!(out, "{bye} became a bye");
    }
    if let Some(champion) = advancement.champion {
        let _ = writeln!(out, "Champion: player {champion}");
    }
    out
}

pub fn render_violations(tournament_id: TournamentId, violations: &[IntegrityViolation]) -> String {
    if violations.is_empty() {
        return format!("Tournament {tournament_id}: no integrity issues\n");
    }

    let mut out = format!(
        "Tournament {tournament_id}: {} integrity issue(s)\n",
        violations.len()
    );
    for v in violations {
        let _ = writeln!(out, "  {v}");
    }
    out
}
