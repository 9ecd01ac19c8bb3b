//! Integration tests for the subscription lifecycle.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (maani-cli migrate)
//! - The server running (cargo run -p maani-server)
//!
//! Run with: cargo test -p maani-integration-tests -- --ignored

use maani_integration_tests::{base_url, client, unique_user_id};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn url(user_id: i32, kind: &str, suffix: &str) -> String {
    format!("{}/api/subscriptions/{user_id}/{kind}{suffix}", base_url())
}

async fn start_trial(user_id: i32, kind: &str) -> Value {
    let resp = client()
        .post(url(user_id, kind, ""))
        .send()
        .await
        .expect("Failed to create subscription");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse subscription")
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_trial_lifecycle() {
    let user_id = unique_user_id();
    let subscription = start_trial(user_id, "seller").await;

    assert_eq!(subscription["status"], "trial");
    assert_eq!(subscription["isTrial"], true);
    assert_eq!(subscription["autoRenew"], true);

    let resp = client()
        .get(url(user_id, "seller", "/trial-days"))
        .send()
        .await
        .expect("Failed to get trial days");
    let body: Value = resp.json().await.expect("Failed to parse trial days");
    assert_eq!(body["trialDaysRemaining"], 90);

    let resp = client()
        .get(url(user_id, "seller", "/active"))
        .send()
        .await
        .expect("Failed to check access");
    let body: Value = resp.json().await.expect("Failed to parse access");
    assert_eq!(body["isActive"], true);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_duplicate_trial_conflicts() {
    let user_id = unique_user_id();
    start_trial(user_id, "buyer").await;

    let resp = client()
        .post(url(user_id, "buyer", ""))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The other side of the marketplace is independent
    start_trial(user_id, "seller").await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_renew_records_payment() {
    let user_id = unique_user_id();
    start_trial(user_id, "seller").await;

    let resp = client()
        .post(url(user_id, "seller", "/renew"))
        .json(&json!({ "amount": "499.00", "transactionId": "pay_it_001" }))
        .send()
        .await
        .expect("Failed to renew");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse subscription");
    assert_eq!(body["status"], "active");
    assert_eq!(body["isTrial"], false);

    let resp = client()
        .get(url(user_id, "seller", "/history"))
        .send()
        .await
        .expect("Failed to get history");
    let payments: Vec<Value> = resp.json().await.expect("Failed to parse history");
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["transactionId"], "pay_it_001");
    assert_eq!(payments[0]["status"], "success");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_cancel_keeps_access() {
    let user_id = unique_user_id();
    start_trial(user_id, "buyer").await;

    let resp = client()
        .post(url(user_id, "buyer", "/cancel"))
        .send()
        .await
        .expect("Failed to cancel");
    let body: Value = resp.json().await.expect("Failed to parse subscription");
    assert_eq!(body["autoRenew"], false);

    let resp = client()
        .get(url(user_id, "buyer", ""))
        .send()
        .await
        .expect("Failed to get status");
    let body: Value = resp.json().await.expect("Failed to parse status");
    assert_eq!(body["isActive"], true);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_missing_subscription() {
    let user_id = unique_user_id();

    let resp = client()
        .get(url(user_id, "buyer", ""))
        .send()
        .await
        .expect("Failed to get status");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client()
        .get(url(user_id, "buyer", "/active"))
        .send()
        .await
        .expect("Failed to check access");
    let body: Value = resp.json().await.expect("Failed to parse access");
    assert_eq!(body["isActive"], false);
}
