//! Stripe REST client for checkout sessions.

use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use powerchip_core::CheckoutSessionId;

use super::error::StripeError;
use super::types::{CheckoutSession, CheckoutSessionRequest, StripeApiError};
use crate::config::StripeConfig;

/// Stripe error code for an unknown object id.
const RESOURCE_MISSING: &str = "resource_missing";

/// Stripe API client for creating and retrieving checkout sessions.
#[derive(Clone)]
pub struct StripeClient {
    /// HTTP client.
    client: Client,
    /// Secret key for bearer authentication.
    secret_key: SecretString,
    /// API base URL without trailing slash.
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a checkout session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Stripe rejects the parameters.
    #[instrument(skip(self, request), fields(line_items = request.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&request.to_form())
            .send()
            .await?;

        let session: CheckoutSession = parse_response(response, None).await?;
        debug!(session_id = %session.id, "Checkout session created");

        Ok(session)
    }

    /// Retrieve a checkout session by id.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::NotFound`] if Stripe has no such session, or
    /// another error if the request fails.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn retrieve_checkout_session(
        &self,
        id: &CheckoutSessionId,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.api_base,
                urlencoding::encode(id.as_str())
            ))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        parse_response(response, Some(id)).await
    }
}

/// Decode a Stripe response, mapping error envelopes to [`StripeError`].
///
/// `lookup` names the object being fetched so a 404 becomes `NotFound`.
async fn parse_response<T>(
    response: Response,
    lookup: Option<&CheckoutSessionId>,
) -> Result<T, StripeError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| StripeError::Parse(e.to_string()));
    }

    let api_error = serde_json::from_str::<StripeApiError>(&body).ok();
    let code = api_error.as_ref().and_then(|e| e.error.code.as_deref());

    if let Some(id) = lookup
        && (status == StatusCode::NOT_FOUND || code == Some(RESOURCE_MISSING))
    {
        return Err(StripeError::NotFound(id.to_string()));
    }

    let message = api_error
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| format!("Stripe returned {status}"));

    warn!(status = status.as_u16(), error = %message, "Stripe API error");

    Err(StripeError::Api {
        status: status.as_u16(),
        message,
    })
}
