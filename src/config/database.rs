//! PostgreSQL settings for the webhook ledger and payment records

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use super::error::ValidationError;

const ACCEPTED_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];
const MAX_POOL_SIZE: u32 = 100;
const MAX_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// One pool serves webhook requests, entitlement reads and the
/// reconciliation worker.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds a request may wait for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Server-side `statement_timeout` applied to every session
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,

    /// Reported as `application_name` in `pg_stat_activity`
    #[serde(default = "default_application_name")]
    pub application_name: String,

    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Session options derived from the URL plus the per-service settings.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ValidationError> {
        if !ACCEPTED_SCHEMES.iter().any(|scheme| self.url.starts_with(scheme)) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        let options = PgConnectOptions::from_str(&self.url)
            .map_err(|_| ValidationError::InvalidDatabaseUrl)?;

        Ok(options.application_name(&self.application_name).options([(
            "statement_timeout",
            format!("{}s", self.statement_timeout_secs),
        )]))
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_URL"));
        }
        self.connect_options()?;

        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidAcquireTimeout);
        }
        if !(1..=MAX_STATEMENT_TIMEOUT_SECS).contains(&self.statement_timeout_secs) {
            return Err(ValidationError::InvalidStatementTimeout);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            statement_timeout_secs: default_statement_timeout(),
            application_name: default_application_name(),
            run_migrations: false,
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_statement_timeout() -> u64 {
    10
}

fn default_application_name() -> String {
    "streamverse-payments".to_string()
}
