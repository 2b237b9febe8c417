//! Reconciliation engine - drives ledger entries through their state machine.
//!
//! One `sweep()` pass:
//!
//! 1. Every `pending` entry is submitted to the payment provider. Success
//!    stores the provider reference and CAS-transitions the entry to
//!    `submitted`. An explicit rejection fails the entry immediately; a
//!    transient failure increments the attempt counter and leaves the entry
//!    `pending` until the counter reaches its cap.
//! 2. Every `submitted` entry is polled. A provider-side `settled` triggers
//!    the settle pair: CAS `submitted -> settled`, then — only for the CAS
//!    winner — the balance delta. A provider-side `failed` (or rejection of
//!    the poll itself) CAS-transitions to `failed` with no balance change.
//!
//! # Concurrency
//!
//! The sweep is safe to invoke concurrently with itself. Every transition is
//! a compare-and-swap, so when two overlapping ticks race on the same entry
//! exactly one wins and the loser's work degrades to a no-op. In particular
//! the balance delta is applied at most once per entry because it is gated on
//! winning the unique `submitted -> settled` transition.
//!
//! # Isolation
//!
//! Entries are independent. A failure while processing one entry is recorded
//! in the [`SweepReport`] and the sweep moves on; it never aborts the tick
//! for the remaining entries.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ledger::{EntryKind, EntryStatus, LedgerEntry};
use crate::provider::{PaymentProvider, ProviderError, ProviderStatus};
use crate::store::{BalanceAccessor, LedgerStore};

/// Outcome of processing a single entry within one tick.
enum TickOutcome {
    /// Entry advanced to `submitted`
    Submitted,
    /// Entry reached `settled` and the balance delta was applied
    Settled,
    /// Entry reached `failed`
    Failed,
    /// Nothing to do this tick (provider still pending, transient failure,
    /// or a lost CAS race)
    Skipped,
}

/// Summary of one reconciliation sweep.
///
/// Returned by the manual trigger endpoint and logged by the scheduler.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Entries that advanced to `submitted` this tick
    pub submitted: usize,

    /// Entries settled this tick (balance applied)
    pub settled: usize,

    /// Entries that reached `failed` this tick
    pub failed: usize,

    /// Entries left untouched (provider pending, transient failures, lost
    /// CAS races)
    pub skipped: usize,

    /// Entries not reached before the tick budget ran out; retried next tick
    pub abandoned: usize,

    /// Entries whose processing errored this tick
    pub errors: Vec<SweepError>,
}

/// One entry that errored during a sweep.
#[derive(Debug, Serialize)]
pub struct SweepError {
    pub entry_id: Uuid,
    pub message: String,
}

/// Drives the per-entry state machine against the injected collaborators.
///
/// The engine owns no state of its own; the ledger store is the single
/// source of truth, which is what lets any number of engine instances (or
/// overlapping ticks of one instance) coexist.
pub struct ReconciliationEngine {
    ledger: Arc<dyn LedgerStore>,
    balances: Arc<dyn BalanceAccessor>,
    provider: Arc<dyn PaymentProvider>,

    /// Transient submission failures tolerated before an entry is failed
    max_submit_attempts: u32,

    /// Wall-clock budget for one sweep; entries beyond it wait for the next
    /// tick
    tick_budget: Duration,
}

impl ReconciliationEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        balances: Arc<dyn BalanceAccessor>,
        provider: Arc<dyn PaymentProvider>,
        max_submit_attempts: u32,
        tick_budget: Duration,
    ) -> Self {
        Self {
            ledger,
            balances,
            provider,
            max_submit_attempts,
            tick_budget,
        }
    }

    /// Run one reconciliation pass over all non-terminal entries.
    ///
    /// Processes `pending` entries first, then `submitted` ones, oldest
    /// first within each phase. The `submitted` set is loaded after the
    /// pending phase completes, so an entry submitted this tick can also be
    /// polled this tick.
    ///
    /// # Errors
    ///
    /// Only loading the work lists can fail the sweep as a whole; per-entry
    /// failures are collected into the report instead.
    pub async fn sweep(&self) -> Result<SweepReport, AppError> {
        let deadline = Instant::now() + self.tick_budget;
        let mut report = SweepReport::default();

        let pending = self.ledger.find_by_status(EntryStatus::Pending).await?;
        for entry in &pending {
            self.process_entry(entry, Phase::Submit, deadline, &mut report)
                .await;
        }

        let submitted = self.ledger.find_by_status(EntryStatus::Submitted).await?;
        for entry in &submitted {
            self.process_entry(entry, Phase::Poll, deadline, &mut report)
                .await;
        }

        Ok(report)
    }

    /// Process one entry, folding its outcome into the report.
    ///
    /// Budget and isolation handling live here so both phases share them: an
    /// exhausted budget abandons the entry for this tick, and an error is
    /// recorded without propagating.
    async fn process_entry(
        &self,
        entry: &LedgerEntry,
        phase: Phase,
        deadline: Instant,
        report: &mut SweepReport,
    ) {
        if Instant::now() >= deadline {
            report.abandoned += 1;
            return;
        }

        let result = match phase {
            Phase::Submit => self.process_pending(entry).await,
            Phase::Poll => self.process_submitted(entry).await,
        };

        match result {
            Ok(TickOutcome::Submitted) => report.submitted += 1,
            Ok(TickOutcome::Settled) => report.settled += 1,
            Ok(TickOutcome::Failed) => report.failed += 1,
            Ok(TickOutcome::Skipped) => report.skipped += 1,
            Err(e) => {
                tracing::error!(entry_id = %entry.id, "reconciliation failed for entry: {e}");
                report.errors.push(SweepError {
                    entry_id: entry.id,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Submit a `pending` entry to the provider.
    async fn process_pending(&self, entry: &LedgerEntry) -> Result<TickOutcome, AppError> {
        let submission = match entry.kind {
            EntryKind::Credit => {
                self.provider
                    .submit_credit(entry.user_id, entry.id, entry.amount_cents)
                    .await
            }
            EntryKind::Debit => {
                self.provider
                    .submit_debit(entry.user_id, entry.id, entry.amount_cents)
                    .await
            }
        };

        match submission {
            Ok(ack) => {
                if self.ledger.mark_submitted(entry.id, &ack.provider_ref).await? {
                    tracing::info!(
                        entry_id = %entry.id,
                        provider_ref = %ack.provider_ref,
                        "entry submitted to provider"
                    );
                    Ok(TickOutcome::Submitted)
                } else {
                    // Another tick submitted this entry first; its reference
                    // stands.
                    Ok(TickOutcome::Skipped)
                }
            }
            Err(ProviderError::Rejected(reason)) => {
                tracing::warn!(entry_id = %entry.id, "provider rejected submission: {reason}");
                if self
                    .ledger
                    .transition(entry.id, EntryStatus::Pending, EntryStatus::Failed)
                    .await?
                {
                    Ok(TickOutcome::Failed)
                } else {
                    Ok(TickOutcome::Skipped)
                }
            }
            Err(ProviderError::Network(reason)) => {
                let attempts = self.ledger.record_attempt(entry.id).await?;
                if attempts >= self.max_submit_attempts {
                    tracing::warn!(
                        entry_id = %entry.id,
                        attempts,
                        "submission retries exhausted: {reason}"
                    );
                    if self
                        .ledger
                        .transition(entry.id, EntryStatus::Pending, EntryStatus::Failed)
                        .await?
                    {
                        Ok(TickOutcome::Failed)
                    } else {
                        Ok(TickOutcome::Skipped)
                    }
                } else {
                    tracing::debug!(
                        entry_id = %entry.id,
                        attempts,
                        "transient submission failure, entry stays pending: {reason}"
                    );
                    Ok(TickOutcome::Skipped)
                }
            }
        }
    }

    /// Poll a `submitted` entry and settle or fail it.
    async fn process_submitted(&self, entry: &LedgerEntry) -> Result<TickOutcome, AppError> {
        // A submitted entry always carries a reference; it was stored in the
        // same CAS that made it submitted.
        let Some(provider_ref) = entry.provider_ref.as_deref() else {
            return Err(AppError::InvalidRequest(format!(
                "submitted entry {} has no provider reference",
                entry.id
            )));
        };

        match self.provider.poll_status(entry.id, provider_ref).await {
            Ok(ProviderStatus::Pending) => Ok(TickOutcome::Skipped),
            Ok(ProviderStatus::Settled) => {
                // The settle pair. Only the winner of this CAS applies the
                // delta, which is the at-most-once guarantee for balances.
                if self
                    .ledger
                    .transition(entry.id, EntryStatus::Submitted, EntryStatus::Settled)
                    .await?
                {
                    let new_balance = self
                        .balances
                        .apply_delta(entry.user_id, entry.balance_delta())
                        .await?;
                    tracing::info!(
                        entry_id = %entry.id,
                        user_id = %entry.user_id,
                        new_balance,
                        "entry settled, balance applied"
                    );
                    Ok(TickOutcome::Settled)
                } else {
                    Ok(TickOutcome::Skipped)
                }
            }
            Ok(ProviderStatus::Failed) | Err(ProviderError::Rejected(_)) => {
                if self
                    .ledger
                    .transition(entry.id, EntryStatus::Submitted, EntryStatus::Failed)
                    .await?
                {
                    tracing::warn!(entry_id = %entry.id, "provider reported entry failed");
                    Ok(TickOutcome::Failed)
                } else {
                    Ok(TickOutcome::Skipped)
                }
            }
            // Polling is not attempt-bounded: the provider has acknowledged
            // this submission, so only its authoritative answer may
            // terminate the entry.
            Err(ProviderError::Network(reason)) => {
                tracing::debug!(
                    entry_id = %entry.id,
                    "transient poll failure, will retry next tick: {reason}"
                );
                Ok(TickOutcome::Skipped)
            }
        }
    }
}

/// Which half of the sweep an entry belongs to.
#[derive(Clone, Copy)]
enum Phase {
    Submit,
    Poll,
}
