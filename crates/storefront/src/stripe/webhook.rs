//! Stripe webhook signature verification.
//!
//! Implements Stripe's scheme:
//! <https://docs.stripe.com/webhooks#verify-manually>
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! The expected signature is HMAC-SHA256 over `"<t>.<raw body>"` keyed with
//! the endpoint's signing secret. Any matching `v1` entry is accepted, which
//! keeps verification working while a secret is being rolled.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, instrument};

use powerchip_core::WebhookEventId;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme accepted by this verifier.
const SCHEME: &str = "v1";

/// Reasons a webhook signature is rejected.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// No `Stripe-Signature` header on the request.
    #[error("Missing Stripe-Signature header")]
    MissingHeader,

    /// Header present but not in `t=...,v1=...` form.
    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    /// Header carries no `v1` signature.
    #[error("No signatures found with expected scheme v1")]
    NoSignatures,

    /// Signed timestamp is too far from the current time.
    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,

    /// No signature matched the payload.
    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,

    /// Signature matched but the payload is not a Stripe event.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// A verified Stripe event.
///
/// Only `type` is required; a signed event with no `id` or `data` is still
/// acknowledged.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: Option<WebhookEventId>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: EventData,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub livemode: bool,
}

/// Event payload wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    /// The object the event is about (a checkout session, a payment intent...).
    #[serde(default)]
    pub object: serde_json::Value,
}

impl Event {
    /// The event id, or `"unknown"` when absent.
    #[must_use]
    pub fn id_str(&self) -> &str {
        self.id.as_ref().map_or("unknown", WebhookEventId::as_str)
    }

    /// The `id` of the event's subject object, if it has one.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(serde_json::Value::as_str)
    }
}

/// Verifies `Stripe-Signature` headers against a signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    /// Create a verifier for one signing secret.
    #[must_use]
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verify the signature and parse the event.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the header is missing or malformed, the
    /// timestamp is stale, no signature matches, or the body is not an event.
    pub fn construct_event(
        &self,
        payload: &[u8],
        header: Option<&str>,
    ) -> Result<Event, SignatureError> {
        let header = header.ok_or(SignatureError::MissingHeader)?;
        self.verify_at(payload, header, chrono::Utc::now().timestamp())?;

        serde_json::from_slice(payload).map_err(|e| SignatureError::InvalidPayload(e.to_string()))
    }

    /// Verify a signature header at a given Unix time.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] describing the first check that failed.
    #[instrument(skip_all)]
    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), SignatureError> {
        let parsed = SignatureHeader::parse(header)?;

        let expected = compute_signature(
            self.secret.expose_secret().as_bytes(),
            parsed.timestamp,
            payload,
        );

        if !parsed
            .signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
        {
            return Err(SignatureError::Mismatch);
        }

        if self.tolerance_secs > 0 && (now - parsed.timestamp).abs() > self.tolerance_secs {
            return Err(SignatureError::TimestampOutsideTolerance);
        }

        debug!("Stripe signature verified");

        Ok(())
    }
}

/// Parsed `Stripe-Signature` header.
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for pair in header.split(',') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                SCHEME => signatures.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Compute the hex `v1` signature for a payload.
///
/// Public so integration tests can sign payloads the way Stripe does.
#[must_use]
pub fn compute_signature(secret: &[u8], timestamp: i64, payload: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return String::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Build a complete `Stripe-Signature` header value.
#[must_use]
pub fn signature_header(secret: &[u8], timestamp: i64, payload: &[u8]) -> String {
    format!(
        "t={timestamp},{SCHEME}={}",
        compute_signature(secret, timestamp, payload)
    )
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
