//! Checkout orchestration.
//!
//! Validates a cart, normalizes quiz answers into session metadata, records
//! the submission in the quiz log, and asks Stripe for a hosted checkout
//! session. Status lookups turn a retrieved session back into the shape the
//! success page renders.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use powerchip_core::{
    CartError, CartItem, CheckoutSessionId, CurrencyCode, PaymentStatus, Price, QuizAnswers,
    QuizMetadata, validate_cart,
};

use super::best_effort;
use super::quiz_log::QuizLog;
use crate::stripe::{CheckoutSession, CheckoutSessionRequest, LineItem, StripeClient, StripeError};

/// Path of the page Stripe redirects to after payment.
pub const SUCCESS_PATH: &str = "/pages/success.html";

/// Path of the page Stripe redirects to when the buyer cancels.
pub const CANCEL_PATH: &str = "/pages/cancel.html";

/// Placeholder Stripe substitutes with the session id on redirect.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart rejected before any gateway call.
    #[error(transparent)]
    InvalidCart(#[from] CartError),

    /// Stripe failed or rejected the request.
    #[error(transparent)]
    Gateway(#[from] StripeError),
}

/// Payment status as reported to the success page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusView {
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub amount_total: Option<u64>,
    pub quiz: QuizAnswers,
}

impl PaymentStatusView {
    /// Project a retrieved session. Missing metadata reads as an empty quiz.
    #[must_use]
    pub fn from_session(session: &CheckoutSession) -> Self {
        let metadata = session.metadata.clone().unwrap_or_default();

        Self {
            status: session.payment_status,
            customer_email: session.customer_email().map(String::from),
            amount_total: session.amount_total,
            quiz: QuizAnswers::from_metadata(&metadata),
        }
    }
}

/// Build the session request for a validated cart.
///
/// Pure: no I/O. Items map one-to-one and in order onto BRL line items with
/// `unit_amount` passed through. `metadata` is attached only when non-empty.
#[must_use]
pub fn build_session_request(
    cart: &[CartItem],
    metadata: QuizMetadata,
    origin: &str,
) -> CheckoutSessionRequest {
    let origin = origin.trim_end_matches('/');

    let line_items = cart
        .iter()
        .map(|item| LineItem {
            name: item.name.clone(),
            description: item.description.clone(),
            unit_amount: item.price,
            currency: CurrencyCode::BRL,
            quantity: item.quantity,
        })
        .collect();

    CheckoutSessionRequest {
        line_items,
        success_url: format!("{origin}{SUCCESS_PATH}?session_id={SESSION_ID_PLACEHOLDER}"),
        cancel_url: format!("{origin}{CANCEL_PATH}"),
        metadata: (!metadata.is_empty()).then_some(metadata),
    }
}

/// Checkout operations over a Stripe client and the quiz log.
pub struct CheckoutService<'a> {
    stripe: &'a StripeClient,
    quiz_log: &'a QuizLog,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(stripe: &'a StripeClient, quiz_log: &'a QuizLog) -> Self {
        Self { stripe, quiz_log }
    }

    /// Create a hosted checkout session and return its id.
    ///
    /// Quiz answers, when present, are appended to the quiz log before the
    /// gateway call, even if nothing survives normalization. A failed append
    /// is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidCart`] without calling Stripe if the
    /// cart is empty, or [`CheckoutError::Gateway`] if Stripe fails.
    #[instrument(skip_all, fields(items = cart.len(), origin = %origin))]
    pub async fn create_checkout(
        &self,
        cart: &[CartItem],
        quiz: Option<&QuizAnswers>,
        origin: &str,
    ) -> Result<CheckoutSessionId, CheckoutError> {
        validate_cart(cart)?;

        let metadata = quiz.map(QuizAnswers::to_metadata).unwrap_or_default();
        if quiz.is_some() {
            best_effort("quiz_log_append", self.quiz_log.append(&metadata)).await;
        }

        let request = build_session_request(cart, metadata, origin);
        let session = self.stripe.create_checkout_session(&request).await?;

        let total: u64 = cart
            .iter()
            .map(|item| item.unit_price().minor_units.saturating_mul(u64::from(item.quantity)))
            .sum();
        info!(
            session_id = %session.id,
            total = %Price::brl(total),
            "Checkout session created"
        );

        Ok(session.id)
    }

    /// Look up a session's payment status.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Gateway`] wrapping [`StripeError::NotFound`]
    /// for unknown ids, or another gateway error.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn get_status(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<PaymentStatusView, CheckoutError> {
        let session = self.stripe.retrieve_checkout_session(id).await?;
        Ok(PaymentStatusView::from_session(&session))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn item(name: &str, price: u64, quantity: u32) -> CartItem {
        CartItem {
            name: name.to_string(),
            description: None,
            price,
            quantity,
        }
    }

    #[test]
    fn test_build_session_request_maps_items_in_order() {
        let cart = vec![item("Powerchip Pro", 49_900, 1), item("Cabo", 1_990, 3)];
        let request = build_session_request(&cart, QuizMetadata::new(), "https://shop.test");

        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.line_items[0].name, "Powerchip Pro");
        assert_eq!(request.line_items[0].unit_amount, 49_900);
        assert_eq!(request.line_items[1].quantity, 3);
        assert!(
            request
                .line_items
                .iter()
                .all(|li| li.currency == CurrencyCode::BRL)
        );
        assert_eq!(request.metadata, None);
    }

    #[test]
    fn test_build_session_request_redirect_urls() {
        let request =
            build_session_request(&[item("X", 100, 1)], QuizMetadata::new(), "https://shop.test/");
        assert_eq!(
            request.success_url,
            "https://shop.test/pages/success.html?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(request.cancel_url, "https://shop.test/pages/cancel.html");
    }

    #[test]
    fn test_build_session_request_attaches_metadata() {
        let quiz = QuizAnswers {
            brand: Some("Volkswagen".to_string()),
            reduce_lag: Some(true),
            ..QuizAnswers::default()
        };
        let request =
            build_session_request(&[item("X", 100, 1)], quiz.to_metadata(), "https://shop.test");
        let metadata = request.metadata.unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("vehicle_brand").unwrap(), "Volkswagen");
        assert_eq!(metadata.get("pref_reduce_lag").unwrap(), "true");
    }

    #[test]
    fn test_status_view_from_session() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_1",
            "payment_status": "paid",
            "customer_details": {"email": "buyer@example.com"},
            "amount_total": 51_890,
            "metadata": {"vehicle_brand": "Fiat", "engine_power_hp": "abc", "pref_more_torque": "true"}
        }))
        .unwrap();

        let view = PaymentStatusView::from_session(&session);
        assert_eq!(view.status, PaymentStatus::Paid);
        assert_eq!(view.customer_email.as_deref(), Some("buyer@example.com"));
        assert_eq!(view.amount_total, Some(51_890));
        assert_eq!(view.quiz.brand.as_deref(), Some("Fiat"));
        assert_eq!(view.quiz.engine_power_hp, None);
        assert_eq!(view.quiz.more_torque, Some(true));
        assert_eq!(view.quiz.reduce_lag, Some(false));
    }

    #[test]
    fn test_status_view_json_shape() {
        let view = PaymentStatusView {
            status: PaymentStatus::Unpaid,
            customer_email: None,
            amount_total: Some(100),
            quiz: QuizAnswers::from_metadata(&BTreeMap::new()),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "unpaid");
        assert_eq!(json["amountTotal"], 100);
        assert!(json.get("customerEmail").is_none());
        assert_eq!(json["quiz"]["brand"], serde_json::Value::Null);
        assert_eq!(json["quiz"]["moreTorque"], false);
    }
}
