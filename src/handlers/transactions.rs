//! Transaction HTTP handlers.
//!
//! This module implements the transaction-related API endpoints:
//! - POST /api/v1/transactions - Record a credit or debit request
//! - GET /api/v1/transactions/:id - Get transaction status

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    models::ledger::{
        CreateTransactionRequest, CreateTransactionResponse, TransactionStatusResponse,
    },
    services::transaction_service,
};

/// Record a new transaction.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": "550e8400-...",
///   "kind": "credit",
///   "amount_cents": 5000,
///   "remark": "weekly recharge"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "id": "770e8400-...",
///   "status": "pending"
/// }
/// ```
///
/// The response is always `pending`: submission to the payment provider and
/// settlement happen asynchronously on the reconciliation sweep, and the
/// entry's status is the way to observe progress.
///
/// # Errors
///
/// - 400: non-positive amount or oversized remark
/// - 404: unknown user id
/// - 422: debit exceeding the current balance
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreateTransactionResponse>), AppError> {
    let entry =
        transaction_service::create_transaction(&state.ledger, &state.balances, request).await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Get the status of a transaction.
///
/// # Response (200)
///
/// ```json
/// {
///   "id": "770e8400-...",
///   "status": "settled",
///   "provider_reference": "TXN-42"
/// }
/// ```
///
/// A `failed` entry reports `failed` and nothing more; the amount is never
/// adjusted after creation.
pub async fn get_transaction_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionStatusResponse>, AppError> {
    let entry = transaction_service::get_transaction(&state.ledger, transaction_id).await?;

    Ok(Json(entry.into()))
}
