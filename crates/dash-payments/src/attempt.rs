//! Payment attempt state.

use crate::provider::InitiatedPayment;
use dash_commerce::{Money, PaymentMethod, TransactionId};
use serde::{Deserialize, Serialize};

/// Status of a single payment attempt.
///
/// `Initiated` and `Processing` are transient; the other three are
/// terminal for the attempt (though not necessarily for the order:
/// a timed-out attempt leaves the order's payment pending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Provider accepted the initiation request.
    Initiated,
    /// Polling for the final status.
    Processing,
    /// Provider confirmed the charge.
    Successful,
    /// Provider reported the charge failed.
    Failed,
    /// Poll budget exhausted without resolution.
    TimedOut,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Initiated => "initiated",
            AttemptStatus::Processing => "processing",
            AttemptStatus::Successful => "successful",
            AttemptStatus::Failed => "failed",
            AttemptStatus::TimedOut => "timed_out",
        }
    }

    /// Check if the attempt can change no further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptStatus::Successful | AttemptStatus::Failed | AttemptStatus::TimedOut
        )
    }
}

/// One attempt to charge an order.
///
/// Ephemeral: lives for the duration of the polling loop and is returned
/// inside the outcome. An order may accumulate several attempts across
/// retries, but only one may be in flight at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentAttempt {
    /// Provider-assigned transaction identifier.
    pub transaction_id: TransactionId,
    /// Method being charged.
    pub method: PaymentMethod,
    /// Exact amount charged, surcharge included.
    pub amount: Money,
    /// Hosted checkout page, for card payments.
    pub checkout_url: Option<String>,
    /// Current status.
    pub status: AttemptStatus,
    /// Number of status checks performed so far.
    pub polls: u32,
}

impl PaymentAttempt {
    /// Create an attempt from a successful initiation.
    pub fn new(initiated: InitiatedPayment, method: PaymentMethod, amount: Money) -> Self {
        Self {
            transaction_id: initiated.transaction_id,
            method,
            amount,
            checkout_url: initiated.checkout_url,
            status: AttemptStatus::Initiated,
            polls: 0,
        }
    }
}
