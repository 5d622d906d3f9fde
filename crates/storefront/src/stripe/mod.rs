//! Stripe API client and webhook signature verification.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`: form-encoded requests, JSON responses
//! - Stripe is the source of truth for checkout sessions - this crate never
//!   stores or mutates a session after creating it, it only reads it back
//! - Webhook payloads are verified against the exact raw request bytes
//!
//! # Example
//!
//! ```rust,ignore
//! use powerchip_storefront::stripe::StripeClient;
//!
//! let client = StripeClient::new(&config.stripe);
//! let session = client.retrieve_checkout_session(&session_id).await?;
//! ```

mod client;
mod error;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{
    CheckoutSession, CheckoutSessionRequest, CustomerDetails, LineItem, StripeApiError,
};
pub use webhook::{Event, EventData, SignatureError, WebhookVerifier};
