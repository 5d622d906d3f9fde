//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Frontend configuration
//! GET  /config/publishable-key       - Stripe publishable key
//! GET  /config/site                  - Support and analytics identifiers
//!
//! # Checkout
//! POST /create-checkout-session      - Create a Stripe checkout session
//! GET  /payment-status/{session_id}  - Payment status for the success page
//! POST /webhook                      - Stripe webhook (raw body, signed)
//!
//! # Posts
//! POST /posts/generate               - Run the generator once
//! GET  /posts/list                   - List generated images and videos
//! GET  /posts/{file}                 - Generated artifacts (static)
//! ```

pub mod checkout;
pub mod posts;
pub mod site;
pub mod webhook;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the frontend configuration routes router.
pub fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/publishable-key", get(site::publishable_key))
        .route("/site", get(site::site))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/config", config_routes())
        .route(
            "/create-checkout-session",
            post(checkout::create_checkout_session),
        )
        .route(
            "/payment-status/{session_id}",
            get(checkout::payment_status),
        )
        .route("/webhook", post(webhook::handle_webhook))
        .route("/posts/generate", post(posts::generate))
        .route("/posts/list", get(posts::list))
}

/// Build the complete application router.
///
/// Generated artifacts are served from the posts directory under `/posts`.
/// `/posts/generate` and `/posts/list` are exact routes and win over files of
/// the same name.
pub fn app(state: AppState) -> Router {
    let posts_dir = state.config().posts_dir.clone();

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/posts", ServeDir::new(posts_dir))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
