//! Transaction Reconciliation Service - Main Application Entry Point
//!
//! This is a REST API server that records credit/debit transactions in an
//! append-only ledger and reconciles them against an external payment
//! provider on a periodic sweep.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Wire the stores, provider client, and reconciliation engine
//! 5. Spawn the periodic sweep scheduler
//! 6. Start server on configured port

use std::sync::Arc;
use std::time::Duration;

use reconciliation_server::{
    AppState, build_router,
    config::Config,
    db,
    engine::ReconciliationEngine,
    provider::{
        PaymentProvider,
        http::{HttpPaymentClient, HttpProviderConfig},
    },
    scheduler,
    store::{
        BalanceAccessor, LedgerStore,
        postgres::{PgBalanceAccessor, PgLedgerStore},
    },
};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Wire the collaborators behind their trait seams
    let ledger: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool.clone()));
    let balances: Arc<dyn BalanceAccessor> = Arc::new(PgBalanceAccessor::new(pool));

    let provider: Arc<dyn PaymentProvider> = Arc::new(HttpPaymentClient::new(HttpProviderConfig {
        base_url: Url::parse(&config.provider_base_url)?,
        secret: config.provider_secret.clone(),
        timeout: Duration::from_secs(config.provider_timeout_secs),
        max_retries: 3,
        retry_backoff: Duration::from_millis(250),
    })?);

    let engine = Arc::new(ReconciliationEngine::new(
        ledger.clone(),
        balances.clone(),
        provider,
        config.max_submit_attempts,
        Duration::from_secs(config.sweep_budget_secs),
    ));

    // Spawn the periodic reconciliation sweep; the task runs for the
    // lifetime of the process
    let _sweeper = scheduler::spawn(
        engine.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );
    tracing::info!(
        interval_secs = config.sweep_interval_secs,
        "Reconciliation scheduler started"
    );

    // Build the router over the shared state
    let app = build_router(AppState {
        ledger,
        balances,
        engine,
    });

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
