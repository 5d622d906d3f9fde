//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::jobs::GeneratorInvoker;
use crate::services::QuizLog;
use crate::stripe::{StripeClient, WebhookVerifier};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the Stripe client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stripe: StripeClient,
    webhook_verifier: Option<WebhookVerifier>,
    quiz_log: QuizLog,
    generator: Arc<GeneratorInvoker>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The webhook verifier exists only when a signing secret is configured.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let stripe = StripeClient::new(&config.stripe);
        let webhook_verifier = config.stripe.webhook_secret.clone().map(|secret| {
            WebhookVerifier::new(secret, config.stripe.webhook_tolerance_secs)
        });
        let quiz_log = QuizLog::new(config.quiz_log_path());
        let generator = Arc::new(GeneratorInvoker::new(config.generator.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                stripe,
                webhook_verifier,
                quiz_log,
                generator,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Stripe API client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Webhook verifier, if a signing secret is configured.
    #[must_use]
    pub fn webhook_verifier(&self) -> Option<&WebhookVerifier> {
        self.inner.webhook_verifier.as_ref()
    }

    /// Get a reference to the quiz submission log.
    #[must_use]
    pub fn quiz_log(&self) -> &QuizLog {
        &self.inner.quiz_log
    }

    /// Shared generator invoker, also handed to the scheduler.
    #[must_use]
    pub fn generator(&self) -> &Arc<GeneratorInvoker> {
        &self.inner.generator
    }
}
