//! Cart items submitted by the storefront frontend.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Errors that can occur when validating a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart has no items (or the item list was absent).
    #[error("cart is empty")]
    Empty,
    /// An item asks for zero units.
    #[error("item {index} has quantity 0")]
    ZeroQuantity {
        /// Position of the offending item.
        index: usize,
    },
}

/// A single line of a submitted cart.
///
/// Immutable once submitted. `price` is already in minor units and is passed
/// to the gateway unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price in centavos.
    pub price: u64,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price with currency attached.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::brl(self.price)
    }
}

/// Validate a submitted cart.
///
/// # Errors
///
/// Returns [`CartError::Empty`] when there are no items and
/// [`CartError::ZeroQuantity`] for the first item with a zero quantity.
pub fn validate_cart(items: &[CartItem]) -> Result<(), CartError> {
    if items.is_empty() {
        return Err(CartError::Empty);
    }
    if let Some(index) = items.iter().position(|item| item.quantity == 0) {
        return Err(CartError::ZeroQuantity { index });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(quantity: u32) -> CartItem {
        CartItem {
            name: "Powerchip Pro".to_string(),
            description: None,
            price: 49_900,
            quantity,
        }
    }

    #[test]
    fn test_validate_empty() {
        assert_eq!(validate_cart(&[]), Err(CartError::Empty));
    }

    #[test]
    fn test_validate_zero_quantity() {
        assert_eq!(
            validate_cart(&[item(1), item(0)]),
            Err(CartError::ZeroQuantity { index: 1 })
        );
    }

    #[test]
    fn test_validate_ok() {
        assert!(validate_cart(&[item(2)]).is_ok());
    }

    #[test]
    fn test_deserialize_without_description() {
        let parsed: CartItem =
            serde_json::from_str(r#"{"name":"Chip","price":1990,"quantity":1}"#).unwrap();
        assert_eq!(parsed.description, None);
        assert_eq!(parsed.unit_price(), Price::brl(1990));
    }

    #[test]
    fn test_negative_price_rejected() {
        let parsed = serde_json::from_str::<CartItem>(r#"{"name":"Chip","price":-1,"quantity":1}"#);
        assert!(parsed.is_err());
    }
}
