//! Frontend configuration endpoints.
//!
//! The static frontend fetches these at load time: the Stripe publishable key
//! for `Stripe.js`, and the support/analytics identifiers it embeds. Unset
//! values are served as empty strings.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// `GET /config/publishable-key` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishableKey {
    pub publishable_key: String,
}

/// `GET /config/site` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub whatsapp: String,
    pub ga4_id: String,
    pub meta_pixel_id: String,
}

/// Stripe publishable key.
pub async fn publishable_key(State(state): State<AppState>) -> Json<PublishableKey> {
    Json(PublishableKey {
        publishable_key: state
            .config()
            .stripe
            .publishable_key
            .clone()
            .unwrap_or_default(),
    })
}

/// Support and analytics identifiers.
pub async fn site(State(state): State<AppState>) -> Json<SiteInfo> {
    let site = &state.config().site;

    Json(SiteInfo {
        whatsapp: site.whatsapp.clone().unwrap_or_default(),
        ga4_id: site.ga4_id.clone().unwrap_or_default(),
        meta_pixel_id: site.meta_pixel_id.clone().unwrap_or_default(),
    })
}
