//! Integration tests for the Powerchip Brasil backend.
//!
//! Each test boots the real storefront router on an ephemeral port, backed by
//! temporary directories and an in-process stand-in for the Stripe API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p powerchip-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout` - Session creation, quiz metadata, payment status
//! - `webhook` - Signature verification and acknowledgement
//! - `posts` - On-demand generation and artifact listing

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;

use powerchip_storefront::config::{
    DEFAULT_WEBHOOK_TOLERANCE_SECS, GeneratorConfig, SiteConfig, StorefrontConfig, StripeConfig,
};
use powerchip_storefront::{AppState, app};

/// Webhook signing secret used by [`TestContext::new`].
pub const WEBHOOK_SECRET: &str = "whsec_integration_signing_secret";

/// Form parameters of one recorded checkout session request.
pub type FormParams = Vec<(String, String)>;

#[derive(Default)]
struct MockStripeState {
    requests: Vec<FormParams>,
    sessions: HashMap<String, Value>,
    /// When set, creates are answered with a 400 carrying this message.
    create_error: Option<String>,
}

/// In-process Stripe stand-in for checkout session create and retrieve.
///
/// Created sessions echo the submitted metadata and the computed total and
/// start out `unpaid`.
#[derive(Clone)]
pub struct MockStripe {
    pub base_url: String,
    state: Arc<Mutex<MockStripeState>>,
}

impl MockStripe {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockStripeState::default()));

        let router = Router::new()
            .route("/v1/checkout/sessions", post(create_session))
            .route("/v1/checkout/sessions/{id}", get(retrieve_session))
            .with_state(Arc::clone(&state));

        let base_url = spawn_server(router).await;
        Self { base_url, state }
    }

    /// Every create request received so far, oldest first.
    pub fn requests(&self) -> Vec<FormParams> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Reject every later create with a Stripe `invalid_request_error`.
    pub fn reject_creates(&self, message: &str) {
        self.state.lock().unwrap().create_error = Some(message.to_string());
    }

    /// Mark a stored session as paid by `email`.
    pub fn mark_paid(&self, id: &str, email: &str) {
        let mut state = self.state.lock().unwrap();
        let session = state.sessions.get_mut(id).expect("unknown session");
        session["payment_status"] = json!("paid");
        session["customer_details"] = json!({ "email": email, "name": "Cliente Teste" });
    }
}

async fn create_session(
    State(state): State<Arc<Mutex<MockStripeState>>>,
    Form(params): Form<FormParams>,
) -> Response {
    let mut state = state.lock().unwrap();

    if let Some(message) = state.create_error.clone() {
        state.requests.push(params);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {
                    "message": message,
                    "type": "invalid_request_error",
                }
            })),
        )
            .into_response();
    }

    let id = format!("cs_test_{}", state.requests.len() + 1);

    let metadata: serde_json::Map<String, Value> = params
        .iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix("metadata[")?.strip_suffix(']')?;
            Some((name.to_string(), json!(value)))
        })
        .collect();

    let session = json!({
        "id": id,
        "object": "checkout.session",
        "payment_status": "unpaid",
        "status": "open",
        "amount_total": amount_total(&params),
        "currency": "brl",
        "url": format!("https://checkout.stripe.test/c/pay/{id}"),
        "metadata": metadata,
    });

    state.requests.push(params);
    state.sessions.insert(id, session.clone());
    Json(session).into_response()
}

async fn retrieve_session(
    State(state): State<Arc<Mutex<MockStripeState>>>,
    UrlPath(id): UrlPath<String>,
) -> Response {
    let state = state.lock().unwrap();
    state.sessions.get(&id).map_or_else(
        || {
            (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": {
                        "code": "resource_missing",
                        "message": format!("No such checkout.session: '{id}'"),
                        "type": "invalid_request_error",
                    }
                })),
            )
                .into_response()
        },
        |session| Json(session.clone()).into_response(),
    )
}

/// Sum of `unit_amount * quantity` over the encoded line items.
fn amount_total(params: &FormParams) -> u64 {
    let lookup = |key: String| {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.parse::<u64>().ok())
    };

    (0..)
        .map_while(|i| {
            let unit = lookup(format!("line_items[{i}][price_data][unit_amount]"))?;
            let quantity = lookup(format!("line_items[{i}][quantity]"))?;
            Some(unit * quantity)
        })
        .sum()
}

/// Look up a single form parameter.
pub fn param<'a>(params: &'a FormParams, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// A running storefront wired to a [`MockStripe`].
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub stripe: MockStripe,
    pub config: StorefrontConfig,
    dir: TempDir,
}

impl TestContext {
    /// Start with default test settings.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start after adjusting the test configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let stripe = MockStripe::start().await;

        let mut config = test_config(dir.path(), &stripe.base_url);
        adjust(&mut config);

        std::fs::create_dir_all(&config.posts_dir).expect("Failed to create posts dir");
        let base_url = spawn_server(app(AppState::new(config.clone()))).await;

        Self {
            client: reqwest::Client::new(),
            base_url,
            stripe,
            config,
            dir,
        }
    }

    /// Absolute URL for a path on the storefront.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Lines currently in the quiz log.
    pub fn quiz_log_lines(&self) -> Vec<Value> {
        std::fs::read_to_string(self.config.quiz_log_path())
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).expect("quiz log line is not JSON"))
            .collect()
    }

    /// Root of the temporary directory tree.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Configuration pointing every directory into `root`.
pub fn test_config(root: &Path, stripe_base: &str) -> StorefrontConfig {
    let posts_dir = root.join("posts");

    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://shop.test".to_string(),
        posts_dir: posts_dir.clone(),
        data_dir: root.join("data"),
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_integration_key"),
            publishable_key: Some("pk_test_integration".to_string()),
            webhook_secret: Some(SecretString::from(WEBHOOK_SECRET)),
            api_base: stripe_base.to_string(),
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        },
        site: SiteConfig {
            whatsapp: Some("5511999990000".to_string()),
            ga4_id: None,
            meta_pixel_id: None,
        },
        generator: GeneratorConfig {
            program: "sh".to_string(),
            entrypoint: root.join("generator.sh").display().to_string(),
            working_dir: None,
            products_path: PathBuf::from("products.csv"),
            brand: "Powerchip Brasil".to_string(),
            output_dir: posts_dir,
        },
        scheduler_enabled: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });

    format!("http://{addr}")
}
