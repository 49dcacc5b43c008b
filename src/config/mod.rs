//! Application configuration module
//!
//! Configuration is read from environment variables using the `config` and
//! `dotenvy` crates. Variables carry the `STREAMVERSE` prefix and nested
//! values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use streamverse_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod boundary;
mod database;
mod error;
mod policy;
mod reconciliation;
mod server;
mod webhook;

pub use boundary::BoundaryConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use policy::PolicyConfig;
pub use reconciliation::{ReconciliationConfig, ResidencyMode};
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Stripe webhook ingestion
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Failed-event reconciliation worker
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    /// Entitlement policy engine
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Outbound payment/policy clients
    #[serde(default)]
    pub boundary: BoundaryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `STREAMVERSE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `STREAMVERSE__WEBHOOK__STRIPE_WEBHOOK_SECRET=whsec_...` -> `webhook.stripe_webhook_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into their expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STREAMVERSE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.webhook.validate()?;
        self.reconciliation.validate()?;
        self.policy.validate()?;
        self.boundary.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
