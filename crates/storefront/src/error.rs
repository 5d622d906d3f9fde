//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Response bodies keep the shapes the frontend already parses: checkout
//! routes answer `{"error": ...}`, post generation answers
//! `{"status": "error", "detail": ...}`, and webhook rejections are plain text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::jobs::GeneratorError;
use crate::services::{CheckoutError, WebhookError};
use crate::stripe::StripeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout flow failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Webhook request rejected.
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// Post generator failed.
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    /// Unknown post type requested.
    #[error("invalid type")]
    InvalidJobKind(String),

    /// Posts directory could not be read.
    #[error("{0}")]
    PostsUnavailable(std::io::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(CheckoutError::InvalidCart(_))
            | Self::Webhook(_)
            | Self::InvalidJobKind(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(CheckoutError::Gateway(StripeError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            Self::Checkout(CheckoutError::Gateway(_))
            | Self::Generator(_)
            | Self::PostsUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        match &self {
            Self::Webhook(err) => (status, err.to_string()).into_response(),
            Self::Generator(_) | Self::InvalidJobKind(_) | Self::PostsUnavailable(_) => (
                status,
                Json(json!({ "status": "error", "detail": self.to_string() })),
            )
                .into_response(),
            Self::Checkout(err) => (status, Json(json!({ "error": err.to_string() }))).into_response(),
            Self::BadRequest(msg) => (status, Json(json!({ "error": msg }))).into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Checkout session created", Some(&[("session_id", "cs_123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
