//! Order and payment status machines.
//!
//! The transition tables here are the single authority on which moves are
//! legal. Everything that changes a status, whether driven by a payment
//! result or by a runner action relayed through the backend, goes through
//! [`OrderStatus::transition`] / [`PaymentStatus::transition`]; an illegal
//! request is an error, never silently coerced.

use crate::error::CommerceError;
use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, waiting for a runner to claim it.
    #[default]
    Pending,
    /// A runner has claimed the order.
    Accepted,
    /// The runner is purchasing the items.
    Shopping,
    /// The runner is on the way with the items.
    Delivering,
    /// Delivery confirmed.
    Completed,
    /// Order cancelled before shopping began.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Shopping => "shopping",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Shopping => "Shopping",
            OrderStatus::Delivering => "Delivering",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Check if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Check if the order can still be cancelled.
    ///
    /// Once shopping has begun the runner has spent money, so
    /// cancellation is no longer allowed.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, Shopping)
                | (Accepted, Cancelled)
                | (Shopping, Delivering)
                | (Delivering, Completed)
        )
    }

    /// Validate a transition, returning the new status.
    pub fn transition(&self, next: OrderStatus) -> Result<OrderStatus, CommerceError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CommerceError::IllegalTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet settled (also the resting state for cash on delivery).
    #[default]
    Pending,
    /// Provider confirmed the charge.
    Paid,
    /// Provider rejected or the charge failed.
    Failed,
    /// A paid order was refunded.
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    /// Whether moving to `next` is a legal transition.
    ///
    /// `Failed → Pending` re-arms the order for a retry with the same or
    /// another method; `Failed → Paid` covers a retry that succeeds
    /// without an explicit re-arm in between.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Failed)
                | (Failed, Pending)
                | (Failed, Paid)
                | (Paid, Refunded)
        )
    }

    /// Validate a transition, returning the new status.
    pub fn transition(&self, next: PaymentStatus) -> Result<PaymentStatus, CommerceError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CommerceError::IllegalPaymentTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}
