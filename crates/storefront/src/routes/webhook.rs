//! Stripe webhook endpoint.
//!
//! The body is taken as raw bytes: the signature covers the exact payload
//! Stripe sent, so it must not be parsed and re-serialized before checking.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::services::{UnverifiedWebhook, dispatch};
use crate::state::AppState;

/// Header carrying Stripe's signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Verify and acknowledge a Stripe event.
///
/// Answers `{"received": true}` once the signature checks out, whatever the
/// event type; rejects with 400 otherwise.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let verified = UnverifiedWebhook::new(&body, signature).verify(state.webhook_verifier())?;
    dispatch(&verified);

    Ok(Json(json!({ "received": true })))
}
