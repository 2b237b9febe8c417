//! PostgreSQL-backed ledger store and balance accessor.
//!
//! Status transitions are compare-and-swap UPDATEs: the WHERE clause pins the
//! expected prior status and `rows_affected()` is the CAS verdict. The
//! database row lock makes each transition all-or-nothing, so overlapping
//! sweeps cannot apply the same transition twice.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::account::Account;
use crate::models::ledger::{EntryStatus, LedgerEntry};
use crate::store::{BalanceAccessor, LedgerStore, NewLedgerEntry};

/// Ledger store over the `ledger_entries` table.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: DbPool,
}

impl PgLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    /// Insert a new entry.
    ///
    /// The status column defaults to `pending` and `amount_cents` carries a
    /// `CHECK (amount_cents > 0)` constraint, so even a caller that skips
    /// service-level validation cannot record a non-positive amount.
    async fn create(&self, new: NewLedgerEntry) -> Result<LedgerEntry, AppError> {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO ledger_entries (user_id, kind, amount_cents, remark)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.kind)
        .bind(new.amount_cents)
        .bind(new.remark)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LedgerEntry>, AppError> {
        let entry = sqlx::query_as::<_, LedgerEntry>("SELECT * FROM ledger_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Oldest first, so earlier requests are always reconciled before newer
    /// ones.
    async fn find_by_status(&self, status: EntryStatus) -> Result<Vec<LedgerEntry>, AppError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM ledger_entries WHERE status = $1 ORDER BY created_at ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// CAS `pending -> submitted` and store the provider reference in one
    /// statement. The provider reference is written exactly once because no
    /// other transition re-enters `submitted`.
    async fn mark_submitted(&self, id: Uuid, provider_ref: &str) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE ledger_entries
            SET status = $1,
                provider_ref = $2,
                updated_at = NOW()
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(EntryStatus::Submitted)
        .bind(provider_ref)
        .bind(id)
        .bind(EntryStatus::Pending)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
    ) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE ledger_entries
            SET status = $1,
                updated_at = NOW()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn record_attempt(&self, id: Uuid) -> Result<u32, AppError> {
        let attempts: i32 = sqlx::query_scalar(
            r#"
            UPDATE ledger_entries
            SET attempts = attempts + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING attempts
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

        Ok(attempts as u32)
    }

    async fn ping(&self) -> Result<(), AppError> {
        // Verify database connectivity with simple query
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Balance accessor over the `accounts` table.
#[derive(Clone)]
pub struct PgBalanceAccessor {
    pool: DbPool,
}

impl PgBalanceAccessor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceAccessor for PgBalanceAccessor {
    async fn get_balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        Ok(account.balance_cents)
    }

    /// Single in-place UPDATE, atomic at the row level. The ledger entry's
    /// CAS transition decides whether this runs at all, never the other way
    /// around.
    async fn apply_delta(&self, user_id: Uuid, delta_cents: i64) -> Result<i64, AppError> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents + $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING balance_cents
            "#,
        )
        .bind(delta_cents)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AccountNotFound)?;

        Ok(balance)
    }
}
