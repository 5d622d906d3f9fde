//! Prices in integer minor currency units.
//!
//! The storefront sends prices to the gateway exactly as the cart submits them:
//! an integer count of the currency's smallest unit (centavos for BRL). No
//! rounding or conversion happens anywhere on the way to the gateway. The
//! decimal form exists only for display in logs and CLI output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money in minor units with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's smallest unit (e.g. centavos).
    pub minor_units: u64,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(minor_units: u64, currency_code: CurrencyCode) -> Self {
        Self {
            minor_units,
            currency_code,
        }
    }

    /// Create a price in the storefront's single supported currency.
    #[must_use]
    pub const fn brl(minor_units: u64) -> Self {
        Self::new(minor_units, CurrencyCode::BRL)
    }

    /// Amount in the currency's standard unit (e.g. reais, not centavos).
    #[must_use]
    pub fn to_major(&self) -> Decimal {
        Decimal::from(self.minor_units) / Decimal::from(100)
    }

    /// Format for display (e.g. "R$ 199.90").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {:.2}", self.currency_code.symbol(), self.to_major())
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
///
/// The storefront only sells in BRL; the enum exists so the gateway
/// parameter is spelled in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    BRL,
}

impl CurrencyCode {
    /// Lowercase code as the gateway expects it.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BRL => "brl",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::BRL => "R$",
        }
    }
}
