//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `checkout` - Checkout session creation and payment status lookup
//! - `quiz_log` - Append-only JSONL log of quiz submissions
//! - `webhook` - Stripe webhook verification and dispatch

pub mod checkout;
pub mod quiz_log;
pub mod webhook;

use std::fmt::Display;

use tracing::warn;

pub use checkout::{CheckoutError, CheckoutService, PaymentStatusView, build_session_request};
pub use quiz_log::{QuizLog, QuizLogError, QuizSummary};
pub use webhook::{EventKind, UnverifiedWebhook, VerifiedEvent, WebhookError, dispatch};

/// Await a side effect whose failure must not affect the caller.
///
/// Errors are logged at WARN with the operation name and discarded.
pub async fn best_effort<T, E>(
    operation: &'static str,
    future: impl Future<Output = Result<T, E>>,
) -> Option<T>
where
    E: Display,
{
    match future.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, error = %e, "Best-effort operation failed");
            None
        }
    }
}
