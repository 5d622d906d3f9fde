//! Stripe-related errors.

use thiserror::Error;

/// Errors that can occur when calling the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed before a response arrived.
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe answered with an error.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The requested object does not exist.
    #[error("No such checkout session: {0}")]
    NotFound(String),

    /// Failed to parse a response body.
    #[error("Stripe response error: {0}")]
    Parse(String),
}
