//! Storefront configuration loaded from environment variables.
//!
//! Loaded once at start-up and passed explicitly through [`AppState`]; nothing
//! else in the crate reads the environment.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` - Stripe secret API key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Fallback origin for checkout redirects
//!   (default: `http://localhost:<port>`)
//! - `STRIPE_PUBLISHABLE_KEY` - Publishable key handed to the browser
//! - `STRIPE_WEBHOOK_SECRET` - Webhook signing secret (webhooks are rejected
//!   while unset)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `STRIPE_WEBHOOK_TOLERANCE_SECS` - Signature timestamp tolerance (default: 300)
//! - `WHATSAPP_PHONE` - Support WhatsApp number
//! - `GA4_ID` - Google Analytics 4 measurement ID
//! - `META_PIXEL_ID` - Meta (Facebook) pixel ID
//! - `POSTS_DIR` - Generated post artifacts directory (default: posts)
//! - `DATA_DIR` - Local data directory for the quiz log (default: data)
//! - `GENERATOR_PROGRAM` - Interpreter for the post generator (default: python)
//! - `GENERATOR_ENTRYPOINT` - Generator script (default: `generate_posts_cli.py`)
//! - `GENERATOR_WORKDIR` - Working directory for the generator
//! - `GENERATOR_PRODUCTS` - Product catalogue CSV (default: products.csv)
//! - `GENERATOR_BRAND` - Brand name printed on posts (default: Powerchip Brasil)
//! - `SCHEDULER_ENABLED` - Run the weekly generation triggers (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//!
//! [`AppState`]: crate::state::AppState

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default Stripe API base URL.
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Default webhook timestamp tolerance, in seconds.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// File name of the quiz submission log inside the data directory.
pub const QUIZ_LOG_FILE: &str = "quiz_submissions.jsonl";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used when a request carries no `Origin` header
    pub base_url: String,
    /// Directory holding generated post artifacts (served under `/posts`)
    pub posts_dir: PathBuf,
    /// Directory holding local data files
    pub data_dir: PathBuf,
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// Public site configuration exposed to the frontend
    pub site: SiteConfig,
    /// External post generator configuration
    pub generator: GeneratorConfig,
    /// Whether the weekly generation triggers run
    pub scheduler_enabled: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Stripe configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// Publishable key (safe to expose in browser)
    pub publishable_key: Option<String>,
    /// Webhook signing secret; webhooks fail closed while unset
    pub webhook_secret: Option<SecretString>,
    /// API base URL
    pub api_base: String,
    /// Maximum age of a webhook signature timestamp, in seconds
    pub webhook_tolerance_secs: i64,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base", &self.api_base)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .finish()
    }
}

/// Support channel and analytics identifiers served to the frontend.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    /// WhatsApp support phone number
    pub whatsapp: Option<String>,
    /// Google Analytics 4 measurement ID
    pub ga4_id: Option<String>,
    /// Meta (Facebook) pixel ID
    pub meta_pixel_id: Option<String>,
}

/// External post generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Program to execute (usually an interpreter)
    pub program: String,
    /// First argument: the generator entry point
    pub entrypoint: String,
    /// Working directory for the process; inherits ours when `None`
    pub working_dir: Option<PathBuf>,
    /// Product catalogue passed as `--products`
    pub products_path: PathBuf,
    /// Brand passed as `--brand`
    pub brand: String,
    /// Output directory passed as `--output-dir`
    pub output_dir: PathBuf,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("PORT", "3000")?;
        let base_url = get_optional_env("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let posts_dir = PathBuf::from(get_env_or_default("POSTS_DIR", "posts"));
        let data_dir = PathBuf::from(get_env_or_default("DATA_DIR", "data"));

        let stripe = StripeConfig::from_env()?;
        let site = SiteConfig::from_env();
        let generator = GeneratorConfig::from_env(posts_dir.clone());

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            posts_dir,
            data_dir,
            stripe,
            site,
            generator,
            scheduler_enabled: parse_env_or_default::<bool>("SCHEDULER_ENABLED", "true")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default::<f32>(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.1",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the append-only quiz submission log.
    #[must_use]
    pub fn quiz_log_path(&self) -> PathBuf {
        self.data_dir.join(QUIZ_LOG_FILE)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            publishable_key: get_optional_env("STRIPE_PUBLISHABLE_KEY"),
            webhook_secret: get_optional_env("STRIPE_WEBHOOK_SECRET").map(SecretString::from),
            api_base: get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            webhook_tolerance_secs: parse_env_or_default::<i64>(
                "STRIPE_WEBHOOK_TOLERANCE_SECS",
                &DEFAULT_WEBHOOK_TOLERANCE_SECS.to_string(),
            )?,
        })
    }
}

impl SiteConfig {
    fn from_env() -> Self {
        Self {
            whatsapp: get_optional_env("WHATSAPP_PHONE"),
            ga4_id: get_optional_env("GA4_ID"),
            meta_pixel_id: get_optional_env("META_PIXEL_ID"),
        }
    }
}

impl GeneratorConfig {
    /// Load generator settings alone, writing into `POSTS_DIR`.
    ///
    /// Used by tools that run the generator without the rest of the server
    /// configuration (no Stripe key required).
    #[must_use]
    pub fn from_env_standalone() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env(PathBuf::from(get_env_or_default("POSTS_DIR", "posts")))
    }

    fn from_env(output_dir: PathBuf) -> Self {
        Self {
            program: get_env_or_default("GENERATOR_PROGRAM", "python"),
            entrypoint: get_env_or_default("GENERATOR_ENTRYPOINT", "generate_posts_cli.py"),
            working_dir: get_optional_env("GENERATOR_WORKDIR").map(PathBuf::from),
            products_path: PathBuf::from(get_env_or_default("GENERATOR_PRODUCTS", "products.csv")),
            brand: get_env_or_default("GENERATOR_BRAND", "Powerchip Brasil"),
            output_dir,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the Stripe dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Fixed configuration for unit tests.
#[cfg(test)]
pub(crate) fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        posts_dir: PathBuf::from("posts"),
        data_dir: PathBuf::from("data"),
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_super_secret_value"),
            publishable_key: Some("pk_test_visible".to_string()),
            webhook_secret: Some(SecretString::from("whsec_super_secret_signing")),
            api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        },
        site: SiteConfig::default(),
        generator: GeneratorConfig {
            program: "python".to_string(),
            entrypoint: "generate_posts_cli.py".to_string(),
            working_dir: None,
            products_path: PathBuf::from("products.csv"),
            brand: "Powerchip Brasil".to_string(),
            output_dir: PathBuf::from("posts"),
        },
        scheduler_enabled: true,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    }
}
