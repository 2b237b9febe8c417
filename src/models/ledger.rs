//! Ledger entry data models and API request/response types.
//!
//! This module defines:
//! - `LedgerEntry`: Database entity tracking one credit/debit end-to-end
//! - `EntryKind` and `EntryStatus`: typed enums for direction and lifecycle
//! - Request/response types for the transaction endpoints

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry.
///
/// - `Credit`: money added to the user's balance (a recharge)
/// - `Debit`: money removed from the user's balance (a redeem)
///
/// Stored in PostgreSQL as the `entry_kind` enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "entry_kind", rename_all = "lowercase")]
pub enum EntryKind {
    Credit,
    Debit,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Credit => write!(f, "credit"),
            EntryKind::Debit => write!(f, "debit"),
        }
    }
}

/// Lifecycle status of a ledger entry.
///
/// Statuses advance monotonically and never regress:
///
/// ```text
/// pending -> submitted -> settled
///        \            \-> failed
///         \-> failed
/// ```
///
/// - `Pending`: recorded locally, not yet acknowledged by the provider
/// - `Submitted`: the provider acknowledged the request and assigned a reference
/// - `Settled`: the provider confirmed the transaction as final; the balance
///   delta has been applied
/// - `Failed`: the provider rejected the request, or submission exhausted its
///   retry budget; no balance change
///
/// Stored in PostgreSQL as the `entry_status` enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "entry_status", rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Submitted,
    Settled,
    Failed,
}

impl EntryStatus {
    /// Terminal statuses are skipped by the reconciliation sweep.
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Settled | EntryStatus::Failed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "pending"),
            EntryStatus::Submitted => write!(f, "submitted"),
            EntryStatus::Settled => write!(f, "settled"),
            EntryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Represents a ledger entry record from the database.
///
/// # Database Table
///
/// Maps to the `ledger_entries` table. Entries are append-only: they are
/// created once, transition through `EntryStatus`, and are never deleted,
/// which keeps the ledger auditable (sum of settled credits minus settled
/// debits equals the balance delta since account creation).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LedgerEntry {
    /// Unique identifier, generated on creation, immutable.
    ///
    /// Doubles as the order id sent to the payment provider.
    pub id: Uuid,

    /// Owning account reference
    pub user_id: Uuid,

    /// Direction of the entry (credit or debit)
    pub kind: EntryKind,

    /// Amount in cents
    ///
    /// Always positive (enforced by CHECK constraint); the sign of the
    /// balance delta comes from `kind`, never from the amount.
    pub amount_cents: i64,

    /// Current lifecycle status
    pub status: EntryStatus,

    /// Opaque reference assigned by the provider when it acknowledges
    /// submission
    ///
    /// NULL while the entry is `pending`; set exactly once at the
    /// `pending -> submitted` transition.
    pub provider_ref: Option<String>,

    /// Number of failed submission attempts so far
    ///
    /// Incremented on transient submission failures; once it reaches the
    /// configured maximum the entry is failed instead of retried.
    pub attempts: i32,

    /// Free-text annotation, immutable after creation
    pub remark: Option<String>,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// When the entry last changed status or recorded an attempt
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Signed balance delta this entry applies at settlement.
    ///
    /// Credits add to the balance, debits subtract from it.
    pub fn balance_delta(&self) -> i64 {
        match self.kind {
            EntryKind::Credit => self.amount_cents,
            EntryKind::Debit => -self.amount_cents,
        }
    }
}

/// Request to create a transaction.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "kind": "credit",
///   "amount_cents": 5000,
///   "remark": "weekly recharge"
/// }
/// ```
///
/// # Validation
///
/// - `amount_cents` must be positive
/// - `user_id` must reference an existing account
/// - `remark` is optional, at most 500 characters
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Account the transaction belongs to
    pub user_id: Uuid,

    /// Credit (recharge) or debit (redeem)
    pub kind: EntryKind,

    /// Amount in cents
    pub amount_cents: i64,

    /// Optional free-text annotation
    pub remark: Option<String>,
}

/// Response returned when a transaction is created.
///
/// The caller always receives `pending` here; settlement happens
/// asynchronously on the reconciliation sweep.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "status": "pending"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub id: Uuid,
    pub status: EntryStatus,
}

impl From<LedgerEntry> for CreateTransactionResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            status: entry.status,
        }
    }
}

/// Response for transaction status queries.
///
/// A `failed` entry reports `failed` with no further detail beyond the
/// terminal classification; the amount is never silently adjusted.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "status": "settled",
///   "provider_reference": "TXN-42"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TransactionStatusResponse {
    pub id: Uuid,
    pub status: EntryStatus,
    pub provider_reference: Option<String>,
}

impl From<LedgerEntry> for TransactionStatusResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            status: entry.status,
            provider_reference: entry.provider_ref,
        }
    }
}
