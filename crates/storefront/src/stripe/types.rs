//! Stripe request and response types.
//!
//! Only the fields this backend reads or writes are modelled; Stripe adds
//! fields freely and unknown ones are ignored on deserialization.

use std::collections::BTreeMap;

use powerchip_core::{CheckoutSessionId, CurrencyCode, PaymentStatus, QuizMetadata};
use serde::{Deserialize, Serialize};

/// Payment methods offered at checkout.
///
/// PIX and Boleto require dashboard activation, so only cards for now.
pub const PAYMENT_METHOD_TYPES: &[&str] = &["card"];

/// Checkout page language.
pub const CHECKOUT_LOCALE: &str = "pt-BR";

/// Countries the store ships to.
pub const ALLOWED_SHIPPING_COUNTRIES: &[&str] = &["BR"];

/// One line of a checkout session, priced inline (`price_data`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub description: Option<String>,
    /// Unit amount in minor units, passed through unmodified.
    pub unit_amount: u64,
    pub currency: CurrencyCode,
    pub quantity: u32,
}

/// Parameters for `POST /v1/checkout/sessions`.
///
/// Mode is always one-time payment and billing address collection is always
/// required; those are not configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Attached quiz metadata. `None` rather than an empty map.
    pub metadata: Option<QuizMetadata>,
}

impl CheckoutSessionRequest {
    /// Encode as Stripe's bracketed form parameters.
    ///
    /// ```text
    /// line_items[0][price_data][currency]=brl
    /// line_items[0][price_data][unit_amount]=49900
    /// shipping_address_collection[allowed_countries][0]=BR
    /// metadata[vehicle_brand]=Volkswagen
    /// ```
    #[must_use]
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = Vec::new();
        let mut push = |key: String, value: &str| form.push((key, value.to_string()));

        for (i, method) in PAYMENT_METHOD_TYPES.iter().enumerate() {
            push(format!("payment_method_types[{i}]"), method);
        }

        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            push(
                format!("{prefix}[price_data][currency]"),
                item.currency.code(),
            );
            push(
                format!("{prefix}[price_data][product_data][name]"),
                &item.name,
            );
            if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
                push(
                    format!("{prefix}[price_data][product_data][description]"),
                    description,
                );
            }
            push(
                format!("{prefix}[price_data][unit_amount]"),
                &item.unit_amount.to_string(),
            );
            push(format!("{prefix}[quantity]"), &item.quantity.to_string());
        }

        push("mode".to_string(), "payment");
        push("success_url".to_string(), &self.success_url);
        push("cancel_url".to_string(), &self.cancel_url);
        push("locale".to_string(), CHECKOUT_LOCALE);
        push("billing_address_collection".to_string(), "required");
        for (i, country) in ALLOWED_SHIPPING_COUNTRIES.iter().enumerate() {
            push(
                format!("shipping_address_collection[allowed_countries][{i}]"),
                country,
            );
        }

        if let Some(metadata) = &self.metadata {
            for (key, value) in metadata {
                push(format!("metadata[{key}]"), value);
            }
        }

        form
    }
}

/// A checkout session as returned by Stripe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: CheckoutSessionId,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub amount_total: Option<u64>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl CheckoutSession {
    /// Customer email captured at checkout, if any.
    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
    }
}

/// Customer details collected on the checkout page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// Error envelope returned by Stripe on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    pub error: StripeApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(metadata: Option<QuizMetadata>) -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            line_items: vec![
                LineItem {
                    name: "Powerchip Pro".to_string(),
                    description: Some("Chip de potência".to_string()),
                    unit_amount: 49_900,
                    currency: CurrencyCode::BRL,
                    quantity: 1,
                },
                LineItem {
                    name: "Cabo".to_string(),
                    description: None,
                    unit_amount: 1_990,
                    currency: CurrencyCode::BRL,
                    quantity: 2,
                },
            ],
            success_url: "https://shop.test/pages/success.html?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://shop.test/pages/cancel.html".to_string(),
            metadata,
        }
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_form_line_items() {
        let form = request(None).to_form();
        assert_eq!(value(&form, "line_items[0][price_data][currency]"), Some("brl"));
        assert_eq!(value(&form, "line_items[0][price_data][unit_amount]"), Some("49900"));
        assert_eq!(
            value(&form, "line_items[0][price_data][product_data][description]"),
            Some("Chip de potência")
        );
        assert_eq!(value(&form, "line_items[1][quantity]"), Some("2"));
        assert_eq!(
            value(&form, "line_items[1][price_data][product_data][description]"),
            None
        );
    }

    #[test]
    fn test_form_fixed_fields() {
        let form = request(None).to_form();
        assert_eq!(value(&form, "mode"), Some("payment"));
        assert_eq!(value(&form, "locale"), Some("pt-BR"));
        assert_eq!(value(&form, "billing_address_collection"), Some("required"));
        assert_eq!(value(&form, "payment_method_types[0]"), Some("card"));
        assert_eq!(
            value(&form, "shipping_address_collection[allowed_countries][0]"),
            Some("BR")
        );
    }

    #[test]
    fn test_form_without_metadata_has_no_metadata_keys() {
        let form = request(None).to_form();
        assert!(!form.iter().any(|(k, _)| k.starts_with("metadata")));
    }

    #[test]
    fn test_form_with_metadata() {
        let mut meta = QuizMetadata::new();
        meta.insert("vehicle_brand".to_string(), "Fiat".to_string());
        let form = request(Some(meta)).to_form();
        assert_eq!(value(&form, "metadata[vehicle_brand]"), Some("Fiat"));
    }

    #[test]
    fn test_deserialize_session() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{
                "id": "cs_test_1",
                "object": "checkout.session",
                "payment_status": "paid",
                "status": "complete",
                "currency": "brl",
                "url": null,
                "customer_details": {"email": "buyer@example.com", "name": "Ana", "phone": null},
                "amount_total": 51890,
                "metadata": {"vehicle_brand": "Fiat"}
            }"#,
        )
        .unwrap();
        assert_eq!(session.id.as_str(), "cs_test_1");
        assert_eq!(session.payment_status, PaymentStatus::Paid);
        assert_eq!(session.customer_email(), Some("buyer@example.com"));
        assert_eq!(session.amount_total, Some(51_890));
    }

    #[test]
    fn test_deserialize_error_envelope() {
        let err: StripeApiError = serde_json::from_str(
            r#"{"error": {"code": "resource_missing", "message": "No such checkout.session: 'cs_x'", "type": "invalid_request_error"}}"#,
        )
        .unwrap();
        assert_eq!(err.error.code.as_deref(), Some("resource_missing"));
    }
}
