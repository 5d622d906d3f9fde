//! Stripe webhook processing.
//!
//! A request body enters as an [`UnverifiedWebhook`]. Verification either
//! yields a [`VerifiedEvent`] or a [`WebhookError`]; only verified events are
//! ever dispatched. Dispatch is observational (logging) and cannot fail the
//! request: once the signature checks out Stripe gets its acknowledgement.

use thiserror::Error;
use tracing::{info, instrument, warn};

use powerchip_core::Price;

use crate::stripe::{CheckoutSession, Event, SignatureError, WebhookVerifier};

/// Reasons a webhook request is rejected.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signing secret configured, so nothing can be verified.
    #[error("Webhook secret not configured")]
    SecretNotConfigured,

    /// Signature verification failed.
    #[error("Webhook Error: {0}")]
    Signature(#[from] SignatureError),
}

/// Event types this backend acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    CheckoutSessionCompleted,
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    /// Any other event type, acknowledged without action.
    Other(String),
}

impl EventKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for EventKind {
    fn from(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A webhook request whose signature has not been checked yet.
#[derive(Debug, Clone, Copy)]
pub struct UnverifiedWebhook<'a> {
    /// Raw request body, byte for byte as received.
    pub body: &'a [u8],
    /// `Stripe-Signature` header value.
    pub signature: Option<&'a str>,
}

impl<'a> UnverifiedWebhook<'a> {
    #[must_use]
    pub const fn new(body: &'a [u8], signature: Option<&'a str>) -> Self {
        Self { body, signature }
    }

    /// Verify against the configured signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::SecretNotConfigured`] when `verifier` is
    /// `None`, otherwise [`WebhookError::Signature`] for any failed check,
    /// including a missing header.
    pub fn verify(self, verifier: Option<&WebhookVerifier>) -> Result<VerifiedEvent, WebhookError> {
        let verifier = verifier.ok_or(WebhookError::SecretNotConfigured)?;
        let event = verifier.construct_event(self.body, self.signature)?;

        Ok(VerifiedEvent {
            kind: EventKind::from(event.event_type.as_str()),
            event,
        })
    }
}

/// An event whose signature has been verified.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    pub kind: EventKind,
    pub event: Event,
}

/// Act on a verified event.
///
/// Returns the kind that was handled. Nothing here can fail the request; an
/// object that does not parse as expected is logged and skipped.
#[instrument(skip_all, fields(event_id = verified.event.id_str(), event_type = verified.kind.as_str()))]
pub fn dispatch(verified: &VerifiedEvent) -> &EventKind {
    let object_id = verified.event.object_id().unwrap_or("unknown");

    match &verified.kind {
        EventKind::CheckoutSessionCompleted => {
            match serde_json::from_value::<CheckoutSession>(verified.event.data.object.clone()) {
                Ok(session) => {
                    let amount = session
                        .amount_total
                        .map_or_else(|| "-".to_string(), |a| Price::brl(a).display());
                    let message = if session.payment_status.is_settled() {
                        "Payment approved"
                    } else {
                        "Checkout completed, payment pending"
                    };
                    info!(
                        session_id = %session.id,
                        payment_status = %session.payment_status,
                        amount = %amount,
                        customer_email = session.customer_email().unwrap_or("-"),
                        "{message}"
                    );
                }
                Err(e) => warn!(
                    session_id = object_id,
                    error = %e,
                    "Completed checkout session could not be parsed"
                ),
            }
        }
        EventKind::PaymentIntentSucceeded => {
            info!(payment_intent_id = object_id, "Payment intent succeeded");
        }
        EventKind::PaymentIntentFailed => {
            warn!(payment_intent_id = object_id, "Payment failed");
        }
        EventKind::Other(event_type) => {
            info!(event_type = %event_type, "Unhandled event");
        }
    }

    &verified.kind
}
