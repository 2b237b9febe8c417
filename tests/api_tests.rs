//! Router-level tests over the in-memory backends.
//!
//! Each test drives the real axum router with `tower::ServiceExt::oneshot`,
//! so routing, extractors, status codes, and the JSON error envelope are all
//! exercised exactly as a client would see them.

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{Harness, harness};
use http_body_util::BodyExt;
use reconciliation_server::store::{BalanceAccessor, LedgerStore};
use reconciliation_server::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// Router wired over a fresh in-memory harness.
fn app(h: &Harness) -> Router {
    build_router(AppState {
        ledger: h.ledger.clone() as Arc<dyn LedgerStore>,
        balances: h.balances.clone() as Arc<dyn BalanceAccessor>,
        engine: h.engine.clone(),
    })
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn create_transaction_returns_pending() {
    let h = harness();
    let user = h.seed_account(0);

    let (status, body) = post_json(
        app(&h),
        "/api/v1/transactions",
        json!({
            "user_id": user,
            "kind": "credit",
            "amount_cents": 5_000,
            "remark": "weekly recharge"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    // The id is a well-formed UUID
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    // Creation never touches the balance
    assert_eq!(h.balance_of(user).await, 0);
}

#[tokio::test]
async fn non_positive_amount_is_a_bad_request() {
    let h = harness();
    let user = h.seed_account(0);

    let (status, body) = post_json(
        app(&h),
        "/api/v1/transactions",
        json!({"user_id": user, "kind": "credit", "amount_cents": 0}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let h = harness();

    let (status, body) = post_json(
        app(&h),
        "/api/v1/transactions",
        json!({"user_id": Uuid::new_v4(), "kind": "credit", "amount_cents": 1_000}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "account_not_found");
}

#[tokio::test]
async fn overdraft_debit_is_unprocessable() {
    let h = harness();
    let user = h.seed_account(1_000);

    let (status, body) = post_json(
        app(&h),
        "/api/v1/transactions",
        json!({"user_id": user, "kind": "debit", "amount_cents": 2_000}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_balance");
}

#[tokio::test]
async fn status_endpoint_reports_the_entry() {
    let h = harness();
    let user = h.seed_account(0);

    let (_, created) = post_json(
        app(&h),
        "/api/v1/transactions",
        json!({"user_id": user, "kind": "credit", "amount_cents": 1_000}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = get_json(app(&h), &format!("/api/v1/transactions/{id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["provider_reference"], Value::Null);
}

#[tokio::test]
async fn missing_transaction_is_not_found() {
    let h = harness();

    let (status, body) = get_json(
        app(&h),
        &format!("/api/v1/transactions/{}", Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "transaction_not_found");
}

#[tokio::test]
async fn balance_endpoint_reports_current_balance() {
    let h = harness();
    let user = h.seed_account(42_000);

    let (status, body) = get_json(app(&h), &format!("/api/v1/accounts/{user}/balance")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], json!(user));
    assert_eq!(body["balance_cents"], 42_000);
}

#[tokio::test]
async fn manual_reconciliation_settles_through_the_api() {
    let h = harness();
    let user = h.seed_account(0);

    let (_, created) = post_json(
        app(&h),
        "/api/v1/transactions",
        json!({"user_id": user, "kind": "credit", "amount_cents": 5_000}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // Force one sweep; the fake provider acknowledges and settles by default
    let (status, report) = post_json(app(&h), "/api/v1/reconciliation/run", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["submitted"], 1);
    assert_eq!(report["settled"], 1);
    assert_eq!(report["errors"], json!([]));

    let (_, body) = get_json(app(&h), &format!("/api/v1/transactions/{id}")).await;
    assert_eq!(body["status"], "settled");

    let (_, balance) = get_json(app(&h), &format!("/api/v1/accounts/{user}/balance")).await;
    assert_eq!(balance["balance_cents"], 5_000);
}

#[tokio::test]
async fn health_reports_connected_store() {
    let h = harness();

    let (status, body) = get_json(app(&h), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
}
