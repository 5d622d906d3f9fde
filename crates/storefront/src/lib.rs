//! Powerchip Brasil storefront backend.
//!
//! Creates Stripe checkout sessions for the static frontend, verifies Stripe
//! webhooks, and runs the external post generator on demand and on a weekly
//! schedule. Exposed as a library so the binary, the CLI and the integration
//! tests share one router and one set of services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;

pub use routes::app;
pub use state::AppState;
