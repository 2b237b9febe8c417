//! In-process ledger store and balance accessor.
//!
//! Backs the integration test suites and local development runs. Semantics
//! mirror the PostgreSQL backend: status transitions are compare-and-swap
//! under a single lock, so concurrent sweeps observe the same at-most-once
//! behavior they get from the database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ledger::{EntryStatus, LedgerEntry};
use crate::store::{BalanceAccessor, LedgerStore, NewLedgerEntry};

/// Ledger entries in a mutex-guarded Vec, in insertion order.
///
/// A Vec (rather than a map) keeps `find_by_status` naturally ordered by
/// creation time; lookups scan linearly, which is fine at test scale.
#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn create(&self, new: NewLedgerEntry) -> Result<LedgerEntry, AppError> {
        let now = Utc::now();
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            kind: new.kind,
            amount_cents: new.amount_cents,
            status: EntryStatus::Pending,
            provider_ref: None,
            attempts: 0,
            remark: new.remark,
            created_at: now,
            updated_at: now,
        };

        let mut entries = self.entries.lock().expect("ledger lock poisoned");
        entries.push(entry.clone());

        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LedgerEntry>, AppError> {
        let entries = self.entries.lock().expect("ledger lock poisoned");
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn find_by_status(&self, status: EntryStatus) -> Result<Vec<LedgerEntry>, AppError> {
        let entries = self.entries.lock().expect("ledger lock poisoned");
        let mut matching: Vec<LedgerEntry> =
            entries.iter().filter(|e| e.status == status).cloned().collect();
        // Insertion order already equals creation order; the stable sort
        // keeps it that way when timestamps tie.
        matching.sort_by_key(|e| e.created_at);
        Ok(matching)
    }

    async fn mark_submitted(&self, id: Uuid, provider_ref: &str) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().expect("ledger lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::TransactionNotFound)?;

        if entry.status != EntryStatus::Pending {
            return Ok(false);
        }

        entry.status = EntryStatus::Submitted;
        entry.provider_ref = Some(provider_ref.to_string());
        entry.updated_at = Utc::now();
        Ok(true)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
    ) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().expect("ledger lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::TransactionNotFound)?;

        if entry.status != from {
            return Ok(false);
        }

        entry.status = to;
        entry.updated_at = Utc::now();
        Ok(true)
    }

    async fn record_attempt(&self, id: Uuid) -> Result<u32, AppError> {
        let mut entries = self.entries.lock().expect("ledger lock poisoned");
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::TransactionNotFound)?;

        entry.attempts += 1;
        entry.updated_at = Utc::now();
        Ok(entry.attempts as u32)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Balances keyed by user id.
#[derive(Default)]
pub struct MemoryBalances {
    balances: Mutex<HashMap<Uuid, i64>>,
}

impl MemoryBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Test-setup counterpart of the out-of-band account
    /// provisioning the production schema assumes.
    pub fn create_account(&self, user_id: Uuid, balance_cents: i64) {
        let mut balances = self.balances.lock().expect("balance lock poisoned");
        balances.insert(user_id, balance_cents);
    }

    /// Drop an account, leaving later accesses to fail with
    /// `AccountNotFound`. Used by tests exercising per-entry error isolation.
    pub fn remove_account(&self, user_id: Uuid) {
        let mut balances = self.balances.lock().expect("balance lock poisoned");
        balances.remove(&user_id);
    }
}

#[async_trait]
impl BalanceAccessor for MemoryBalances {
    async fn get_balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        let balances = self.balances.lock().expect("balance lock poisoned");
        balances.get(&user_id).copied().ok_or(AppError::AccountNotFound)
    }

    async fn apply_delta(&self, user_id: Uuid, delta_cents: i64) -> Result<i64, AppError> {
        let mut balances = self.balances.lock().expect("balance lock poisoned");
        let balance = balances.get_mut(&user_id).ok_or(AppError::AccountNotFound)?;
        *balance += delta_cents;
        Ok(*balance)
    }
}
