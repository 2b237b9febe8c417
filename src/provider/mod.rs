//! External payment provider client.
//!
//! The provider is the authority on whether funds actually moved. This module
//! defines the narrow contract the reconciliation engine relies on — submit a
//! credit, submit a debit, poll a status — and a typed split of its failure
//! modes, so the engine never branches on a catch-all error:
//!
//! - [`ProviderError::Network`]: transient (connect failure, timeout,
//!   unparseable or unstructured response). Safe to retry.
//! - [`ProviderError::Rejected`]: the provider explicitly rejected the
//!   request. Terminal; the entry goes straight to `failed`.

pub mod http;

use async_trait::async_trait;
use uuid::Uuid;

/// Provider acknowledgment of a submission.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Opaque reference the provider assigned to this transaction.
    pub provider_ref: String,
}

/// Authoritative status of a previously submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    /// The provider is still processing; poll again later.
    Pending,
    /// Funds have moved; the transaction is final.
    Settled,
    /// The provider abandoned the transaction; no funds moved.
    Failed,
}

/// Failure modes of a provider call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Transient transport-level failure; the call may be retried.
    #[error("provider request failed: {0}")]
    Network(String),

    /// The provider explicitly rejected the request; never retried.
    #[error("provider rejected the request: {0}")]
    Rejected(String),
}

/// Remote payment provider operations.
///
/// `order_id` is always the ledger entry id, which makes every submission
/// naturally idempotent on the provider side: re-submitting after a crash
/// reuses the same order key.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Submit a deposit (credit) for acknowledgment.
    async fn submit_credit(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
    ) -> Result<Submission, ProviderError>;

    /// Submit a withdrawal (debit) for acknowledgment.
    async fn submit_debit(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
    ) -> Result<Submission, ProviderError>;

    /// Ask the provider for the authoritative status of a submitted
    /// transaction.
    async fn poll_status(
        &self,
        order_id: Uuid,
        provider_ref: &str,
    ) -> Result<ProviderStatus, ProviderError>;
}
