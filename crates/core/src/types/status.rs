//! Status enums reported by the payment gateway.

use serde::{Deserialize, Serialize};

/// Payment status of a checkout session.
///
/// Maps to the gateway's `payment_status` values. Values added by the gateway
/// later deserialize as [`PaymentStatus::Unknown`] instead of failing the
/// whole session lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Whether funds are secured (or none were needed).
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "paid"),
            Self::Unpaid => write!(f, "unpaid"),
            Self::NoPaymentRequired => write!(f, "no_payment_required"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
