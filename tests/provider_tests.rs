//! HTTP payment client tests against a mock provider server.
//!
//! These pin the classification contract: a structured rejection is terminal
//! whatever the HTTP status, while unparseable bodies, unstructured non-2xx
//! responses, and timeouts are all transient — and transient failures are
//! retried with backoff.

use std::time::Duration;

use reconciliation_server::provider::http::{HttpPaymentClient, HttpProviderConfig};
use reconciliation_server::provider::{PaymentProvider, ProviderError, ProviderStatus};
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointed at the mock server.
///
/// Classification tests use `max_retries = 0` so a transient outcome
/// surfaces immediately instead of being retried.
fn client(server: &MockServer, max_retries: u32, timeout_ms: u64) -> HttpPaymentClient {
    HttpPaymentClient::new(HttpProviderConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        secret: "test-secret".into(),
        timeout: Duration::from_millis(timeout_ms),
        max_retries,
        retry_backoff: Duration::from_millis(10),
    })
    .unwrap()
}

#[tokio::test]
async fn successful_submission_returns_provider_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        // Submissions are signed
        .and(header_exists("X-Signature"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": true, "transaction_id": "TXN-1"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let submission = client(&server, 0, 1_000)
        .submit_credit(Uuid::new_v4(), Uuid::new_v4(), 5_000)
        .await
        .unwrap();

    assert_eq!(submission.provider_ref, "TXN-1");
}

#[tokio::test]
async fn structured_rejection_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/withdrawals"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": false, "message": "insufficient funds at provider"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = client(&server, 0, 1_000)
        .submit_debit(Uuid::new_v4(), Uuid::new_v4(), 2_000)
        .await
        .unwrap_err();

    match err {
        ProviderError::Rejected(msg) => assert_eq!(msg, "insufficient funds at provider"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn structured_rejection_on_error_status_is_still_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        .respond_with(ResponseTemplate::new(422).set_body_raw(
            r#"{"success": false, "message": "limit exceeded"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = client(&server, 0, 1_000)
        .submit_credit(Uuid::new_v4(), Uuid::new_v4(), 5_000)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(_)));
}

#[tokio::test]
async fn unstructured_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = client(&server, 0, 1_000)
        .submit_credit(Uuid::new_v4(), Uuid::new_v4(), 5_000)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network(_)));
}

#[tokio::test]
async fn unparseable_success_body_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server, 0, 1_000)
        .submit_credit(Uuid::new_v4(), Uuid::new_v4(), 5_000)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network(_)));
}

#[tokio::test]
async fn timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"{"success": true, "transaction_id": "TXN-1"}"#,
                    "application/json",
                )
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    // 50ms timeout against a 500ms response
    let err = client(&server, 0, 50)
        .submit_credit(Uuid::new_v4(), Uuid::new_v4(), 5_000)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network(_)));
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let server = MockServer::start().await;

    // First two calls fail unstructured, then the provider recovers
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/deposits"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": true, "transaction_id": "TXN-9"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let submission = client(&server, 3, 1_000)
        .submit_credit(Uuid::new_v4(), Uuid::new_v4(), 5_000)
        .await
        .unwrap();

    assert_eq!(submission.provider_ref, "TXN-9");
}

#[tokio::test]
async fn poll_parses_the_three_statuses() {
    for (wire, expected) in [
        ("settled", ProviderStatus::Settled),
        ("pending", ProviderStatus::Pending),
        ("failed", ProviderStatus::Failed),
    ] {
        let server = MockServer::start().await;
        let order_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/api/transactions"))
            .and(query_param("order_id", order_id.to_string()))
            .and(query_param("provider_ref", "TXN-1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!(r#"{{"success": true, "status": "{wire}"}}"#),
                "application/json",
            ))
            .mount(&server)
            .await;

        let status = client(&server, 0, 1_000)
            .poll_status(order_id, "TXN-1")
            .await
            .unwrap();

        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn poll_with_unknown_status_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": true, "status": "mystery"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = client(&server, 0, 1_000)
        .poll_status(Uuid::new_v4(), "TXN-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network(_)));
}
