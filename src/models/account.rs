//! Account data models and API response types.
//!
//! Account rows hold the single balance value per user. The rest of the user
//! profile (name, email, authentication) lives in an external user store and
//! is not duplicated here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an account record from the database.
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision
/// issues. For example $10.50 is stored as 1050 cents.
///
/// The balance is never written by request handlers; every mutation flows
/// through a settled ledger entry, applied by the reconciliation engine.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Current balance in cents (not dollars)
    pub balance_cents: i64,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last balance update
    pub updated_at: DateTime<Utc>,
}

/// Response body for balance queries.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "balance_cents": 100000
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance_cents: i64,
}
