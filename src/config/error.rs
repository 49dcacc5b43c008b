//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Shutdown grace must be between 1 and 60 seconds")]
    InvalidShutdownGrace,

    #[error("Invalid listen address: {0}")]
    InvalidListenAddress(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool needs max_connections >= 1 and min_connections <= max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Pool acquire timeout must be positive")]
    InvalidAcquireTimeout,

    #[error("Statement timeout must be between 1 and 60 seconds")]
    InvalidStatementTimeout,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Signature tolerance must be between 1 and 3600 seconds")]
    InvalidSignatureTolerance,

    #[error("Reconciliation interval must be positive")]
    InvalidReconciliationInterval,

    #[error("Reconciliation batch size must be between 1 and 1000")]
    InvalidBatchSize,

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Boundary timeout must be between 1 and 30 seconds")]
    InvalidBoundaryTimeout,
}
