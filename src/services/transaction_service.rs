//! Transaction service - request-side logic for the ledger.
//!
//! This service handles:
//! - Input validation
//! - Recording new ledger entries in `pending`
//! - Status lookups
//!
//! # What it deliberately does NOT do
//!
//! No balance is read-modify-written here, and no provider call happens on
//! the request path. The caller receives `pending` and the reconciliation
//! engine takes it from there; that separation is what keeps balance
//! mutation auditable and at-most-once.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::ledger::{CreateTransactionRequest, EntryKind, LedgerEntry};
use crate::store::{BalanceAccessor, LedgerStore, NewLedgerEntry};

/// Longest accepted free-text remark.
const MAX_REMARK_CHARS: usize = 500;

/// Record a new transaction as a `pending` ledger entry.
///
/// # Validation
///
/// - `amount_cents` must be positive
/// - `remark`, when present, is capped at 500 characters
/// - `user_id` must reference an existing account
/// - a debit larger than the current balance is rejected up front
///
/// The debit guard is a request-time courtesy only: the authoritative
/// balance change still happens at settlement, after the provider confirms.
///
/// # Errors
///
/// - `InvalidRequest`: non-positive amount or oversized remark
/// - `AccountNotFound`: unknown user id
/// - `InsufficientBalance`: debit exceeding the current balance
/// - `Database`: storage error
pub async fn create_transaction(
    ledger: &Arc<dyn LedgerStore>,
    balances: &Arc<dyn BalanceAccessor>,
    request: CreateTransactionRequest,
) -> Result<LedgerEntry, AppError> {
    // Validate amount
    if request.amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    // Validate remark length
    if let Some(ref remark) = request.remark {
        if remark.chars().count() > MAX_REMARK_CHARS {
            return Err(AppError::InvalidRequest(format!(
                "Remark exceeds {MAX_REMARK_CHARS} characters"
            )));
        }
    }

    // Validate the user exists; also fetches the balance for the debit guard
    let balance = balances.get_balance(request.user_id).await?;

    if request.kind == EntryKind::Debit && balance < request.amount_cents {
        return Err(AppError::InsufficientBalance);
    }

    // Record the entry; it starts pending and is picked up by the next sweep
    let entry = ledger
        .create(NewLedgerEntry {
            user_id: request.user_id,
            kind: request.kind,
            amount_cents: request.amount_cents,
            remark: request.remark,
        })
        .await?;

    tracing::info!(
        entry_id = %entry.id,
        user_id = %entry.user_id,
        kind = %entry.kind,
        amount_cents = entry.amount_cents,
        "transaction recorded"
    );

    Ok(entry)
}

/// Look up a ledger entry by id.
///
/// # Errors
///
/// - `TransactionNotFound`: no entry with this id
/// - `Database`: storage error
pub async fn get_transaction(
    ledger: &Arc<dyn LedgerStore>,
    transaction_id: Uuid,
) -> Result<LedgerEntry, AppError> {
    ledger
        .get(transaction_id)
        .await?
        .ok_or(AppError::TransactionNotFound)
}
