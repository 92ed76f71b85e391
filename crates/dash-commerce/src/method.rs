//! Payment method types.

use serde::{Deserialize, Serialize};

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Mobile money (MoMo) charge against the customer's phone.
    #[default]
    MobileMoney,
    /// Card payment through a hosted checkout page.
    Card,
    /// Cash handed to the runner on delivery.
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "momo",
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "Mobile Money",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cash => "Cash on Delivery",
        }
    }

    /// Parse a method string (e.g., from a persisted order).
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "momo" | "mobile_money" => Some(PaymentMethod::MobileMoney),
            "card" => Some(PaymentMethod::Card),
            "cash" => Some(PaymentMethod::Cash),
            _ => None,
        }
    }

    /// Whether the provider confirms this method out-of-band.
    ///
    /// Asynchronous methods need the status polling loop; cash settles
    /// on delivery with no provider involvement.
    pub fn is_asynchronous(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_roundtrip() {
        for m in [
            PaymentMethod::MobileMoney,
            PaymentMethod::Card,
            PaymentMethod::Cash,
        ] {
            assert_eq!(PaymentMethod::from_str_opt(m.as_str()), Some(m));
        }
    }

    #[test]
    fn test_cash_is_synchronous() {
        assert!(!PaymentMethod::Cash.is_asynchronous());
        assert!(PaymentMethod::Card.is_asynchronous());
        assert!(PaymentMethod::MobileMoney.is_asynchronous());
    }
}
