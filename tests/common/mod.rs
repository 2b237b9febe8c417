//! Shared fixtures for the integration suites: in-memory stores, a
//! scriptable payment provider double, and an engine harness.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use reconciliation_server::engine::ReconciliationEngine;
use reconciliation_server::models::ledger::{CreateTransactionRequest, EntryKind, LedgerEntry};
use reconciliation_server::provider::{
    PaymentProvider, ProviderError, ProviderStatus, Submission,
};
use reconciliation_server::services::transaction_service;
use reconciliation_server::store::memory::{MemoryBalances, MemoryLedger};
use reconciliation_server::store::{BalanceAccessor, LedgerStore};

/// Scripted behavior for a submission, keyed by order id.
#[derive(Clone)]
pub enum SubmitScript {
    /// Acknowledge with `REF-<order id>`
    Succeed,
    /// Structured rejection with this message
    Reject(&'static str),
    /// Transient failure
    NetworkFail,
}

/// Scripted behavior for a status poll, keyed by order id.
#[derive(Clone, Copy)]
pub enum PollScript {
    Settled,
    Pending,
    Failed,
    NetworkFail,
}

/// Hand-rolled provider double.
///
/// Unscripted orders submit successfully and poll as settled, so the happy
/// path needs no setup; tests script the exceptions per order id.
#[derive(Default)]
pub struct FakeProvider {
    submit_scripts: Mutex<HashMap<Uuid, SubmitScript>>,
    poll_scripts: Mutex<HashMap<Uuid, PollScript>>,
    pub submit_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_submit(&self, order_id: Uuid, script: SubmitScript) {
        self.submit_scripts
            .lock()
            .unwrap()
            .insert(order_id, script);
    }

    pub fn script_poll(&self, order_id: Uuid, script: PollScript) {
        self.poll_scripts.lock().unwrap().insert(order_id, script);
    }

    fn submit(&self, order_id: Uuid) -> Result<Submission, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .submit_scripts
            .lock()
            .unwrap()
            .get(&order_id)
            .cloned()
            .unwrap_or(SubmitScript::Succeed);

        match script {
            SubmitScript::Succeed => Ok(Submission {
                provider_ref: format!("REF-{order_id}"),
            }),
            SubmitScript::Reject(msg) => Err(ProviderError::Rejected(msg.to_string())),
            SubmitScript::NetworkFail => Err(ProviderError::Network("connection reset".into())),
        }
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn submit_credit(
        &self,
        _user_id: Uuid,
        order_id: Uuid,
        _amount_cents: i64,
    ) -> Result<Submission, ProviderError> {
        self.submit(order_id)
    }

    async fn submit_debit(
        &self,
        _user_id: Uuid,
        order_id: Uuid,
        _amount_cents: i64,
    ) -> Result<Submission, ProviderError> {
        self.submit(order_id)
    }

    async fn poll_status(
        &self,
        order_id: Uuid,
        _provider_ref: &str,
    ) -> Result<ProviderStatus, ProviderError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .poll_scripts
            .lock()
            .unwrap()
            .get(&order_id)
            .copied()
            .unwrap_or(PollScript::Settled);

        match script {
            PollScript::Settled => Ok(ProviderStatus::Settled),
            PollScript::Pending => Ok(ProviderStatus::Pending),
            PollScript::Failed => Ok(ProviderStatus::Failed),
            PollScript::NetworkFail => Err(ProviderError::Network("connection reset".into())),
        }
    }
}

/// Everything a reconciliation test needs, wired over the in-memory stores.
pub struct Harness {
    pub ledger: Arc<MemoryLedger>,
    pub balances: Arc<MemoryBalances>,
    pub provider: Arc<FakeProvider>,
    pub engine: Arc<ReconciliationEngine>,
}

/// Default harness: 5 submission attempts, generous tick budget.
pub fn harness() -> Harness {
    harness_with(5, Duration::from_secs(30))
}

pub fn harness_with(max_submit_attempts: u32, tick_budget: Duration) -> Harness {
    let ledger = Arc::new(MemoryLedger::new());
    let balances = Arc::new(MemoryBalances::new());
    let provider = Arc::new(FakeProvider::new());

    let engine = Arc::new(ReconciliationEngine::new(
        ledger.clone() as Arc<dyn LedgerStore>,
        balances.clone() as Arc<dyn BalanceAccessor>,
        provider.clone() as Arc<dyn PaymentProvider>,
        max_submit_attempts,
        tick_budget,
    ));

    Harness {
        ledger,
        balances,
        provider,
        engine,
    }
}

impl Harness {
    /// Seed an account and return its id.
    pub fn seed_account(&self, balance_cents: i64) -> Uuid {
        let user_id = Uuid::new_v4();
        self.balances.create_account(user_id, balance_cents);
        user_id
    }

    /// Create a transaction through the service layer, as a request would.
    pub async fn create(&self, user_id: Uuid, kind: EntryKind, amount_cents: i64) -> LedgerEntry {
        let ledger = self.ledger.clone() as Arc<dyn LedgerStore>;
        let balances = self.balances.clone() as Arc<dyn BalanceAccessor>;

        transaction_service::create_transaction(
            &ledger,
            &balances,
            CreateTransactionRequest {
                user_id,
                kind,
                amount_cents,
                remark: None,
            },
        )
        .await
        .expect("transaction creation should succeed")
    }

    /// Current status of an entry.
    pub async fn status_of(&self, id: Uuid) -> reconciliation_server::models::ledger::EntryStatus {
        self.ledger
            .get(id)
            .await
            .unwrap()
            .expect("entry should exist")
            .status
    }

    pub async fn balance_of(&self, user_id: Uuid) -> i64 {
        self.balances.get_balance(user_id).await.unwrap()
    }
}
