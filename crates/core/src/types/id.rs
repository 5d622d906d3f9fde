//! Newtype IDs for gateway-assigned identifiers.
//!
//! The payment gateway owns every identifier we handle (`cs_...`, `pi_...`,
//! `evt_...`). They are opaque strings: never parsed, never generated locally.
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! passing a payment intent id where a checkout session id is expected.

/// Macro to define a type-safe, gateway-assigned ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use powerchip_core::define_id;
/// define_id!(SessionId);
/// define_id!(IntentId);
///
/// let session = SessionId::new("cs_test_123");
/// let intent = IntentId::new("pi_test_123");
///
/// // These are different types, so this won't compile:
/// // let _: SessionId = intent;
/// assert_eq!(session.as_str(), "cs_test_123");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a gateway-assigned identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the owned identifier.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CheckoutSessionId);
define_id!(WebhookEventId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_id() {
        let id = CheckoutSessionId::new("cs_test_a1b2");
        assert_eq!(id.to_string(), "cs_test_a1b2");
    }

    #[test]
    fn test_serde_transparent() {
        let id = CheckoutSessionId::new("cs_test_a1b2");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cs_test_a1b2\"");

        let parsed: CheckoutSessionId = serde_json::from_str("\"cs_live_zz\"").unwrap();
        assert_eq!(parsed.as_str(), "cs_live_zz");
    }

    #[test]
    fn test_conversions() {
        let id: WebhookEventId = "evt_123".into();
        let raw: String = id.clone().into();
        assert_eq!(raw, "evt_123");
        assert_eq!(id.into_inner(), "evt_123");
    }
}
