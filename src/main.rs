//! StreamVerse payments service
//!
//! ## REST Endpoints
//!
//! - `POST /payments/webhook` - Stripe webhook handler
//! - `GET /payments/entitlements/:user_id` - Entitlement records for a user
//! - `POST /policy/v1/entitlements/evaluate` - Entitlement policy decision
//! - `GET /health` - Liveness probe

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use streamverse_payments::adapters::http::{
    app_router, shutdown_signal, PaymentsAppState, PolicyAppState,
};
use streamverse_payments::adapters::{
    PostgresPaymentRepository, PostgresWebhookEventStore, ReconciliationWorker,
};
use streamverse_payments::application::{
    ProcessWebhookHandler, ReplayFailedWebhooksHandler, WebhookProcessor,
};
use streamverse_payments::config::AppConfig;
use streamverse_payments::domain::payments::StripeWebhookVerifier;
use streamverse_payments::domain::policy::{EntitlementPolicyEngine, PolicySettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);
    tracing::info!(
        port = config.server.port,
        environment = ?config.server.environment,
        "Starting StreamVerse payments service"
    );

    // Database
    let pool = config
        .database
        .pool_options()
        .connect_with(config.database.connect_options()?)
        .await?;
    tracing::info!("Database pool created");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    // Webhook pipeline
    let ledger = Arc::new(
        PostgresWebhookEventStore::new(pool.clone())
            .with_stale_processing_after(config.webhook.stale_processing_after()),
    );
    let payments = Arc::new(PostgresPaymentRepository::new(pool));
    let processor = Arc::new(
        WebhookProcessor::new(
            ledger.clone(),
            payments.clone(),
            payments.clone(),
            payments.clone(),
        )
        .with_max_error_len(config.webhook.max_error_len),
    );

    let verifier = config
        .webhook
        .stripe_webhook_secret
        .clone()
        .filter(|_| config.webhook.is_configured())
        .map(|secret: SecretString| {
            Arc::new(StripeWebhookVerifier::new(secret).with_tolerance(config.webhook.tolerance()))
        });
    if verifier.is_none() {
        tracing::warn!("Stripe webhook secret not configured; webhook endpoint will answer 503");
    }

    // Reconciliation worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let replay = Arc::new(ReplayFailedWebhooksHandler::new(
        ledger.clone(),
        processor.clone(),
    ));
    let worker = ReconciliationWorker::new(config.reconciliation.clone(), replay);
    let worker_handle = tokio::spawn(async move {
        if let Err(err) = worker.run(shutdown_rx).await {
            tracing::error!(error = %err, "Reconciliation worker did not start");
        }
    });

    // HTTP
    let payments_state = PaymentsAppState {
        webhook_handler: Arc::new(ProcessWebhookHandler::new(verifier, processor)),
        subscriptions: payments.clone(),
        purchases: payments,
    };
    let policy_state = PolicyAppState {
        engine: Arc::new(EntitlementPolicyEngine::new(PolicySettings::from(&config.policy))),
    };
    let app = app_router(payments_state, policy_state, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(config.server.shutdown_grace(), worker_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "Reconciliation worker panicked"),
        Err(_) => tracing::warn!("Reconciliation worker still running after shutdown grace"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.as_str()));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
