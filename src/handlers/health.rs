//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{AppState, error::AppError};

/// Health check response.
///
/// Returns service status and ledger store connectivity.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Ledger store connection status
    pub store: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Ledger store connectivity (cheap probe)
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "store": "connected",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// If the store is unreachable, returns the standard error response.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.ledger.ping().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        store: "connected".to_string(),
        timestamp: Utc::now(),
    }))
}
