//! Stripe webhook verification.

use reqwest::StatusCode;
use serde_json::{Value, json};

use powerchip_integration_tests::{TestContext, WEBHOOK_SECRET};
use powerchip_storefront::stripe::webhook::signature_header;

fn event(kind: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_test_1",
        "object": "event",
        "type": kind,
        "created": 1_767_225_600,
        "livemode": false,
        "data": {
            "object": {
                "id": "cs_test_1",
                "object": "checkout.session",
                "payment_status": "paid",
                "amount_total": 49_900,
                "customer_details": { "email": "cliente@example.com" }
            }
        }
    }))
    .unwrap()
}

fn sign(payload: &[u8]) -> String {
    signature_header(
        WEBHOOK_SECRET.as_bytes(),
        chrono::Utc::now().timestamp(),
        payload,
    )
}

async fn post_webhook(ctx: &TestContext, payload: Vec<u8>, signature: Option<String>) -> reqwest::Response {
    let mut request = ctx
        .client
        .post(ctx.url("/webhook"))
        .header("content-type", "application/json")
        .body(payload);
    if let Some(signature) = signature {
        request = request.header("stripe-signature", signature);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn test_signed_events_are_acknowledged() {
    let ctx = TestContext::new().await;

    for kind in [
        "checkout.session.completed",
        "payment_intent.succeeded",
        "payment_intent.payment_failed",
        "customer.created",
    ] {
        let payload = event(kind);
        let signature = sign(&payload);
        let resp = post_webhook(&ctx, payload, Some(signature)).await;

        assert_eq!(resp.status(), StatusCode::OK, "{kind}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "received": true }));
    }
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = post_webhook(&ctx, event("checkout.session.completed"), None).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.unwrap().starts_with("Webhook Error: "));
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let ctx = TestContext::new().await;

    let signature = sign(&event("checkout.session.completed"));
    let resp = post_webhook(&ctx, event("payment_intent.succeeded"), Some(signature)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.unwrap().starts_with("Webhook Error: "));
}

#[tokio::test]
async fn test_stale_signature_is_rejected() {
    let ctx = TestContext::new().await;

    let payload = event("checkout.session.completed");
    let stale = chrono::Utc::now().timestamp() - 3_600;
    let signature = signature_header(WEBHOOK_SECRET.as_bytes(), stale, &payload);
    let resp = post_webhook(&ctx, payload, Some(signature)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhooks_rejected_without_secret() {
    let ctx = TestContext::with_config(|config| config.stripe.webhook_secret = None).await;

    let payload = event("checkout.session.completed");
    let signature = sign(&payload);
    let resp = post_webhook(&ctx, payload, Some(signature)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Webhook secret not configured");
}

#[tokio::test]
async fn test_minimal_signed_event_is_acknowledged() {
    let ctx = TestContext::new().await;

    let payload = br#"{"type":"customer.created"}"#.to_vec();
    let signature = sign(&payload);
    let resp = post_webhook(&ctx, payload, Some(signature)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "received": true }));
}
