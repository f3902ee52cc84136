//! Command-line front end for single-elimination brackets.
//!
//! Tournaments live in PostgreSQL; every command opens a pool, runs once
//! and exits.

mod commands;
mod config;
mod logging;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Error;
use bracketeer::db::Database;
use bracketeer::tournament::TournamentManager;
use pico_args::Arguments;

use commands::Command;
use config::CliConfig;

const HELP: &str = "\
Run single-elimination tournaments with automatic byes

USAGE:
  bracketeer [OPTIONS] <COMMAND>

COMMANDS:
  create --name NAME --players FILE [--randomize]
                           Create a tournament from a file with one player per line
  list                     List tournaments with progress
  show ID [--json]         Show the bracket of a tournament
  winner MATCH_ID PLAYER_ID
                           Record the winner of a match
  verify ID                Check a tournament for integrity issues
  delete ID                Delete a tournament with its players and matches
  migrate                  Create the database tables

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Maximum pool size
  DB_QUERY_TIMEOUT         Per-query timeout in seconds
  BRACKETEER_RANDOMIZE     Shuffle player lists on create (true/false)
  RUST_LOG                 Log filter [default: info,sqlx=warn]
  (A .env file in the working directory is loaded first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let command = Command::parse(&mut pargs)?;
    commands::finish(pargs)?;

    logging::init();

    let randomize_flag = matches!(command, Command::Create { randomize: true, .. });
    let config = CliConfig::from_env(database_url, randomize_flag)?;
    config.validate()?;

    let start = Instant::now();
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    logging::log_performance(
        "connect",
        start.elapsed().as_millis() as u64,
        Some(&format!("max_connections={}", config.database.max_connections)),
    );

    let name = command.name();
    let start = Instant::now();

    let output = if command == Command::Migrate {
        db.migrate().await?;
        commands::Output {
            text: "Database schema is up to date\n".to_string(),
            failed: false,
        }
    } else {
        let manager = TournamentManager::new(Arc::new(db.repository()));
        let result = commands::run(command, &manager, config.randomize).await;
        match result {
            Ok(output) => output,
            Err(e) => {
                db.close().await;
                return Err(e);
            }
        }
    };

    logging::log_performance(name, start.elapsed().as_millis() as u64, None);
    db.close().await;

    print!("{}", output.text);
    if output.failed {
        std::process::exit(1);
    }

    Ok(())
}
