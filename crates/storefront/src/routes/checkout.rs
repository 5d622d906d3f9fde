//! Checkout route handlers.
//!
//! `POST /create-checkout-session` starts a Stripe hosted checkout for the
//! cart in the request body; `GET /payment-status/{session_id}` reports how
//! it went, for the success page.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, header::ORIGIN},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use powerchip_core::{CartItem, CheckoutSessionId, QuizAnswers};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{CheckoutService, PaymentStatusView};
use crate::state::AppState;

/// `POST /create-checkout-session` body.
///
/// A missing body or missing `items` reads as an empty cart.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub quiz: Option<QuizAnswers>,
}

/// `POST /create-checkout-session` response.
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    pub id: CheckoutSessionId,
}

/// Create a hosted checkout session.
///
/// Redirect URLs are built from the request's `Origin` so buyers return to
/// whichever deployment of the frontend they came from; the configured base
/// URL is used when the header is absent.
#[instrument(skip_all)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreateCheckoutResponse>> {
    let request = parse_request(&body)?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && *v != "null")
        .unwrap_or(state.config().base_url.as_str());

    let id = CheckoutService::new(state.stripe(), state.quiz_log())
        .create_checkout(&request.items, request.quiz.as_ref(), origin)
        .await?;

    add_breadcrumb(
        "checkout",
        "Checkout session created",
        Some(&[("session_id", id.as_str())]),
    );

    Ok(Json(CreateCheckoutResponse { id }))
}

/// Report a session's payment status.
#[instrument(skip(state))]
pub async fn payment_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<PaymentStatusView>> {
    let id = CheckoutSessionId::new(session_id);

    let view = CheckoutService::new(state.stripe(), state.quiz_log())
        .get_status(&id)
        .await?;

    Ok(Json(view))
}

fn parse_request(body: &[u8]) -> Result<CreateCheckoutRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateCheckoutRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_body_is_empty_cart() {
        let request = parse_request(b"").unwrap();
        assert!(request.items.is_empty());
        assert!(request.quiz.is_none());
    }

    #[test]
    fn test_parse_body_without_items() {
        let request = parse_request(br#"{"quiz": {"brand": "Fiat"}}"#).unwrap();
        assert!(request.items.is_empty());
        assert_eq!(request.quiz.unwrap().brand.as_deref(), Some("Fiat"));
    }

    #[test]
    fn test_parse_items() {
        let request = parse_request(
            br#"{"items": [{"name": "Powerchip Pro", "price": 49900, "quantity": 1}]}"#,
        )
        .unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].price, 49_900);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_request(b"{not json"),
            Err(AppError::BadRequest(_))
        ));
    }
}
