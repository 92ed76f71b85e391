//! Payment error types.

use dash_commerce::OrderId;
use thiserror::Error;

/// Errors that can occur while initiating or confirming a payment.
///
/// A timeout is not an error: polling that exhausts its budget resolves
/// to [`crate::PaymentOutcome::TimedOut`], because the order is not
/// failed and the charge may still settle server-side.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// The provider rejected the initiation request. Terminal for this
    /// attempt; the user may retry with the same or another method.
    #[error("Payment initiation failed: {0}")]
    Initiation(String),

    /// A payment attempt is already in flight for this order.
    #[error("A payment attempt is already in flight for order {0}")]
    AttemptInFlight(OrderId),

    /// Provider call failed (network, malformed response).
    #[error("Payment provider error: {0}")]
    Provider(String),
}
