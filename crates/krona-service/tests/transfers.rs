//! Transfer and history integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

async fn transfer(
    harness: &TestHarness,
    token: &str,
    recipient: &str,
    amount_cents: i64,
) -> axum_test::TestResponse {
    harness
        .server
        .post("/v1/transactions")
        .add_header("authorization", TestHarness::bearer(token))
        .json(&json!({
            "recipient_email": recipient,
            "amount_cents": amount_cents,
        }))
        .await
}

// ============================================================================
// Transfers
// ============================================================================

#[tokio::test]
async fn transfer_moves_funds_between_accounts() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    let bob = harness.onboard("bob@example.com").await;

    let response = harness
        .server
        .post("/v1/transactions")
        .add_header("authorization", TestHarness::bearer(&alice))
        .json(&json!({
            "recipient_email": "bob@example.com",
            "amount_cents": 2500,
            "message": "lunch",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance_after_cents"], 7500);
    assert_eq!(body["transaction"]["amount_cents"], 2500);
    assert_eq!(body["transaction"]["is_incoming"], false);
    assert_eq!(body["transaction"]["message"], "lunch");

    let bob_account = harness
        .server
        .get("/v1/account")
        .add_header("authorization", TestHarness::bearer(&bob))
        .await;
    let bob_body: serde_json::Value = bob_account.json();
    assert_eq!(bob_body["balance_cents"], 12_500);
    assert_eq!(bob_body["transaction_count"], 1);
    assert_eq!(bob_body["recent_transactions"][0]["is_incoming"], true);
}

#[tokio::test]
async fn transfer_with_insufficient_funds_carries_balances() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    harness.onboard("bob@example.com").await;

    let response = transfer(&harness, &alice, "bob@example.com", 20_000).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["balance"], 10_000);
    assert_eq!(body["error"]["details"]["required"], 20_000);

    // Nothing moved and nothing was recorded.
    let account = harness
        .server
        .get("/v1/account")
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;
    let account_body: serde_json::Value = account.json();
    assert_eq!(account_body["balance_cents"], 10_000);
    assert_eq!(account_body["transaction_count"], 0);
}

#[tokio::test]
async fn transfer_to_unknown_recipient_is_not_found() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;

    let response = transfer(&harness, &alice, "nobody@example.com", 100).await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn transfer_to_self_is_rejected() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;

    let response = transfer(&harness, &alice, "alice@example.com", 100).await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_recipient");
}

#[tokio::test]
async fn transfer_rejects_non_positive_amount() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    harness.onboard("bob@example.com").await;

    let zero = transfer(&harness, &alice, "bob@example.com", 0).await;
    zero.assert_status_bad_request();

    let negative = transfer(&harness, &alice, "bob@example.com", -500).await;
    negative.assert_status_bad_request();
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn history_paginates_newest_first() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    harness.onboard("bob@example.com").await;

    for i in 1..=5 {
        let response = transfer(&harness, &alice, "bob@example.com", 100 * i).await;
        response.assert_status(StatusCode::CREATED);
    }

    let response = harness
        .server
        .get("/v1/transactions")
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 5);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["transactions"][0]["amount_cents"], 500);
    assert_eq!(body["transactions"][1]["amount_cents"], 400);

    let last_page = harness
        .server
        .get("/v1/transactions")
        .add_query_param("page", 3)
        .add_query_param("limit", 2)
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;
    let last_body: serde_json::Value = last_page.json();
    assert_eq!(last_body["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(last_body["transactions"][0]["amount_cents"], 100);
}

#[tokio::test]
async fn history_with_huge_page_number_is_empty() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    harness.onboard("bob@example.com").await;
    transfer(&harness, &alice, "bob@example.com", 100).await;

    let response = harness
        .server
        .get("/v1/transactions")
        .add_query_param("page", usize::MAX)
        .add_query_param("limit", 2)
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn history_page_past_end_is_empty_with_totals() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    harness.onboard("bob@example.com").await;
    transfer(&harness, &alice, "bob@example.com", 100).await;

    let response = harness
        .server
        .get("/v1/transactions")
        .add_query_param("page", 99)
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 1);
}

// ============================================================================
// Single transaction
// ============================================================================

#[tokio::test]
async fn transaction_is_visible_to_both_participants_only() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;
    let bob = harness.onboard("bob@example.com").await;
    let carol = harness.onboard("carol@example.com").await;

    let response = transfer(&harness, &alice, "bob@example.com", 750).await;
    let body: serde_json::Value = response.json();
    let id = body["transaction"]["id"].as_str().unwrap().to_string();

    let as_alice = harness
        .server
        .get(&format!("/v1/transactions/{id}"))
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;
    as_alice.assert_status_ok();
    let alice_view: serde_json::Value = as_alice.json();
    assert_eq!(alice_view["is_incoming"], false);

    let as_bob = harness
        .server
        .get(&format!("/v1/transactions/{id}"))
        .add_header("authorization", TestHarness::bearer(&bob))
        .await;
    as_bob.assert_status_ok();
    let bob_view: serde_json::Value = as_bob.json();
    assert_eq!(bob_view["is_incoming"], true);

    let as_carol = harness
        .server
        .get(&format!("/v1/transactions/{id}"))
        .add_header("authorization", TestHarness::bearer(&carol))
        .await;
    as_carol.assert_status_forbidden();
}

#[tokio::test]
async fn malformed_transaction_id_is_not_found() {
    let harness = TestHarness::new();
    let alice = harness.onboard("alice@example.com").await;

    let response = harness
        .server
        .get("/v1/transactions/not-a-ulid")
        .add_header("authorization", TestHarness::bearer(&alice))
        .await;

    response.assert_status_not_found();
}
