//! Account HTTP handlers.
//!
//! Only a balance lookup lives here. Account provisioning and profile
//! management belong to the external user store; this service owns nothing
//! about an account beyond its balance and the ledger behind it.

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{AppState, error::AppError, models::account::BalanceResponse};

/// Get the current balance of an account.
///
/// # Endpoint
///
/// `GET /api/v1/accounts/:id/balance`
///
/// # Response (200)
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "balance_cents": 100000
/// }
/// ```
///
/// The value reflects settled entries only; pending and submitted entries
/// have not moved the balance yet.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance_cents = state.balances.get_balance(user_id).await?;

    Ok(Json(BalanceResponse {
        user_id,
        balance_cents,
    }))
}
