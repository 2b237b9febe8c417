//! HTTP client for the payment provider's JSON API.
//!
//! # Endpoints
//!
//! - `POST {base}/api/deposits` — submit a credit
//! - `POST {base}/api/withdrawals` — submit a debit
//! - `GET {base}/api/transactions?order_id=&provider_ref=` — status query
//!
//! Submissions carry an HMAC-SHA256 signature of the request body in the
//! `X-Signature` header so the provider can verify the caller.
//!
//! # Response envelope
//!
//! Every endpoint answers with a `success` flag:
//!
//! ```json
//! {"success": true, "transaction_id": "TXN-42"}
//! {"success": true, "status": "settled"}
//! {"success": false, "message": "player not recognized"}
//! ```
//!
//! A body that parses with `success = false` is an explicit rejection
//! regardless of HTTP status. Anything that does not parse — including a
//! non-2xx status with no structured error — is classified as a transient
//! network failure.
//!
//! # Retry policy
//!
//! Transient failures are retried in-client a bounded number of times with
//! exponential backoff; rejections are returned immediately. Every request
//! runs under the configured timeout, and a timeout counts as transient.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use url::Url;
use uuid::Uuid;

use crate::provider::{PaymentProvider, ProviderError, ProviderStatus, Submission};

type HmacSha256 = Hmac<Sha256>;

/// Connection settings for the provider client.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Base URL of the provider API
    pub base_url: Url,

    /// Shared secret for request signing
    pub secret: String,

    /// Per-request timeout; a timeout is a transient failure
    pub timeout: Duration,

    /// Transient failures retried per call before giving up
    pub max_retries: u32,

    /// Initial backoff delay, doubled on each retry
    pub retry_backoff: Duration,
}

/// Body of a submission request.
#[derive(Debug, Serialize)]
struct SubmitRequest {
    player_id: Uuid,
    order_id: Uuid,
    amount_cents: i64,
}

/// Provider response to a submission.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    success: bool,
    transaction_id: Option<String>,
    message: Option<String>,
}

/// Provider response to a status query.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    status: Option<String>,
    message: Option<String>,
}

/// reqwest-backed implementation of [`PaymentProvider`].
pub struct HttpPaymentClient {
    http: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpPaymentClient {
    /// Build the client with its timeout baked into the connection pool.
    pub fn new(config: HttpProviderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { http, config })
    }

    /// Generate the HMAC-SHA256 signature for a request body.
    ///
    /// # Format
    ///
    /// `sha256=<hex_encoded_hmac>`
    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.config.secret.as_bytes())
            .expect("HMAC key length is valid");
        mac.update(payload.as_bytes());
        let result = mac.finalize();
        format!("sha256={}", hex::encode(result.into_bytes()))
    }

    fn join(&self, path: &str) -> Result<Url, ProviderError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ProviderError::Network(format!("invalid provider URL: {e}")))
    }

    /// Submit to one of the two submission endpoints.
    async fn submit(
        &self,
        path: &str,
        user_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
    ) -> Result<Submission, ProviderError> {
        let url = self.join(path)?;
        let body = SubmitRequest {
            player_id: user_id,
            order_id,
            amount_cents,
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| ProviderError::Network(format!("failed to serialize request: {e}")))?;
        let signature = self.sign(&payload);

        let mut attempt: u32 = 0;
        loop {
            let result = self.try_submit(&url, &payload, &signature).await;
            match result {
                Err(ProviderError::Network(ref msg)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff * 2u32.pow(attempt - 1);
                    tracing::debug!(
                        %order_id,
                        attempt,
                        ?delay,
                        "transient provider failure, retrying: {msg}"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn try_submit(
        &self,
        url: &Url,
        payload: &str,
        signature: &str,
    ) -> Result<Submission, ProviderError> {
        let response = self
            .http
            .post(url.clone())
            .header("Content-Type", "application/json")
            .header("X-Signature", signature)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to read response: {e}")))?;

        // Classification happens on the parsed body first: a structured
        // rejection is terminal even on a non-2xx status.
        match serde_json::from_str::<SubmitResponse>(&body) {
            Ok(parsed) if parsed.success => parsed
                .transaction_id
                .map(|provider_ref| Submission { provider_ref })
                .ok_or_else(|| {
                    ProviderError::Network("provider acknowledged without a reference".into())
                }),
            Ok(parsed) => Err(ProviderError::Rejected(
                parsed
                    .message
                    .unwrap_or_else(|| "request rejected by provider".into()),
            )),
            Err(_) => Err(ProviderError::Network(format!(
                "provider returned {status} with no parseable body"
            ))),
        }
    }

    async fn try_poll(&self, url: &Url) -> Result<ProviderStatus, ProviderError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to read response: {e}")))?;

        match serde_json::from_str::<StatusResponse>(&body) {
            Ok(parsed) if parsed.success => match parsed.status.as_deref() {
                Some("settled") => Ok(ProviderStatus::Settled),
                Some("pending") => Ok(ProviderStatus::Pending),
                Some("failed") => Ok(ProviderStatus::Failed),
                other => Err(ProviderError::Network(format!(
                    "provider reported unrecognized status {other:?}"
                ))),
            },
            Ok(parsed) => Err(ProviderError::Rejected(
                parsed
                    .message
                    .unwrap_or_else(|| "status query rejected by provider".into()),
            )),
            Err(_) => Err(ProviderError::Network(format!(
                "provider returned {status} with no parseable body"
            ))),
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentClient {
    async fn submit_credit(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
    ) -> Result<Submission, ProviderError> {
        self.submit("api/deposits", user_id, order_id, amount_cents)
            .await
    }

    async fn submit_debit(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        amount_cents: i64,
    ) -> Result<Submission, ProviderError> {
        self.submit("api/withdrawals", user_id, order_id, amount_cents)
            .await
    }

    async fn poll_status(
        &self,
        order_id: Uuid,
        provider_ref: &str,
    ) -> Result<ProviderStatus, ProviderError> {
        let mut url = self.join("api/transactions")?;
        url.query_pairs_mut()
            .append_pair("order_id", &order_id.to_string())
            .append_pair("provider_ref", provider_ref);

        let mut attempt: u32 = 0;
        loop {
            let result = self.try_poll(&url).await;
            match result {
                Err(ProviderError::Network(ref msg)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff * 2u32.pow(attempt - 1);
                    tracing::debug!(
                        %order_id,
                        attempt,
                        ?delay,
                        "transient provider failure, retrying: {msg}"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
