//! Transaction reconciliation service.
//!
//! Records credit/debit requests in an append-only ledger, submits them to an
//! external payment provider, and reconciles ledger state against the
//! provider's authoritative status on a periodic sweep. A user's balance
//! changes exactly once per settled entry — the `submitted -> settled`
//! compare-and-swap on the ledger entry gates the balance delta, so
//! overlapping sweeps and retries can never double-apply.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Ledger / Balances**: PostgreSQL with sqlx behind injectable traits
//! - **Payment Provider**: JSON/HTTPS client with timeout, retry, signing
//! - **Reconciliation**: periodic sweep driving each entry's state machine

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod scheduler;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::engine::ReconciliationEngine;
use crate::store::{BalanceAccessor, LedgerStore};

/// Shared application state handed to every handler.
///
/// Collaborators are injected as trait objects so the binary wires the
/// PostgreSQL backends while the test suites wire in-memory ones against the
/// exact same router.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
    pub balances: Arc<dyn BalanceAccessor>,
    pub engine: Arc<ReconciliationEngine>,
}

/// Build the HTTP router.
///
/// # Routes
///
/// - `GET /health` - liveness and store connectivity
/// - `POST /api/v1/transactions` - record a credit/debit request
/// - `GET /api/v1/transactions/{id}` - transaction status
/// - `GET /api/v1/accounts/{id}/balance` - current balance
/// - `POST /api/v1/reconciliation/run` - force one sweep
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/v1/transactions",
            post(handlers::transactions::create_transaction),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(handlers::transactions::get_transaction_status),
        )
        .route(
            "/api/v1/accounts/{id}/balance",
            get(handlers::accounts::get_balance),
        )
        .route(
            "/api/v1/reconciliation/run",
            post(handlers::reconciliation::run_sweep),
        )
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Browsers hitting the API directly (admin tooling) need CORS
        .layer(CorsLayer::permissive())
        .with_state(state)
}
