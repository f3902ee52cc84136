//! CLI configuration management.
//!
//! Reads the environment once (after `.env` is loaded) and applies
//! command-line overrides on top.

use bracketeer::db::{ConfigError, DatabaseConfig, config::parse_env_or};

/// Complete CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Shuffle player lists before seeding
    pub randomize: bool,
}

impl CliConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL (from `--db-url`)
    /// * `randomize_override` - Set when `--randomize` was passed
    ///
    /// # Errors
    ///
    /// Returns error if `DATABASE_URL` is missing and not overridden, or a
    /// variable does not parse
    pub fn from_env(
        database_url_override: Option<String>,
        randomize_override: bool,
    ) -> Result<Self, ConfigError> {
        let database = match database_url_override {
            Some(url) => DatabaseConfig::with_url(url)?,
            None => DatabaseConfig::from_env()?,
        };

        let randomize = randomize_override || parse_env_or("BRACKETEER_RANDOMIZE", false)?;

        Ok(Self {
            database,
            randomize,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let db = &self.database;

        if db.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if db.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if db.min_connections > db.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    db.max_connections
                ),
            });
        }

        for (var, secs) in [
            ("DB_CONNECTION_TIMEOUT", db.connection_timeout_secs),
            ("DB_QUERY_TIMEOUT", db.query_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }
}
