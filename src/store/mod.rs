//! Ledger store and balance accessor abstractions.
//!
//! The reconciliation engine and the HTTP handlers never touch the database
//! directly; they go through the two traits defined here, injected at boot.
//! Two implementations are provided:
//!
//! - [`postgres`]: the production backend, one row per ledger entry with
//!   compare-and-swap status transitions expressed as guarded UPDATEs
//! - [`memory`]: an in-process backend for the test suites and local runs
//!
//! # CAS transitions
//!
//! Every status change is a compare-and-swap: it succeeds only if the entry
//! still holds the expected prior status, and reports the outcome as a bool.
//! A `false` result means another sweep already performed the transition; the
//! caller treats it as a no-op, which is what makes overlapping sweeps safe
//! without any additional locking.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ledger::{EntryKind, EntryStatus, LedgerEntry};

/// Fields required to create a ledger entry.
///
/// Input validation (positive amount, known user, remark length) happens in
/// the service layer before a `NewLedgerEntry` is built; the database CHECK
/// constraints are the backstop.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: Uuid,
    pub kind: EntryKind,
    pub amount_cents: i64,
    pub remark: Option<String>,
}

/// Durable, append-only record of transactions.
///
/// Entries are never deleted; they only advance through `EntryStatus`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new entry in `pending` status and return it.
    async fn create(&self, new: NewLedgerEntry) -> Result<LedgerEntry, AppError>;

    /// Fetch a single entry by id.
    async fn get(&self, id: Uuid) -> Result<Option<LedgerEntry>, AppError>;

    /// All entries currently in `status`, oldest first.
    ///
    /// Oldest-first ordering keeps the sweep fair: entries created earlier
    /// are always reconciled before newer ones.
    async fn find_by_status(&self, status: EntryStatus) -> Result<Vec<LedgerEntry>, AppError>;

    /// CAS `pending -> submitted`, storing the provider reference in the
    /// same step.
    ///
    /// Returns `false` if the entry was no longer `pending`.
    async fn mark_submitted(&self, id: Uuid, provider_ref: &str) -> Result<bool, AppError>;

    /// CAS transition from `from` to `to`.
    ///
    /// Returns `true` only if the entry's current status equalled `from`;
    /// `false` is a lost race, not an error.
    async fn transition(
        &self,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
    ) -> Result<bool, AppError>;

    /// Increment the entry's failed-submission counter and return the new
    /// count.
    async fn record_attempt(&self, id: Uuid) -> Result<u32, AppError>;

    /// Store connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Reads and writes a user's current balance.
///
/// `apply_delta` is only ever called by the reconciliation engine, after it
/// has won the `submitted -> settled` CAS on the corresponding ledger entry.
/// That single-writer protocol is what makes the pairing "transition +
/// apply_delta" effectively atomic: a lost CAS means some other sweep owns
/// the pair, and the loser never touches the balance.
#[async_trait]
pub trait BalanceAccessor: Send + Sync {
    /// Current balance in cents. Fails with `AccountNotFound` for unknown
    /// users, which is also how transaction creation validates the user id.
    async fn get_balance(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Atomically add `delta_cents` (may be negative) to the balance and
    /// return the new value.
    async fn apply_delta(&self, user_id: Uuid, delta_cents: i64) -> Result<i64, AppError>;
}
