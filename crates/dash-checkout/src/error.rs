//! Checkout error types.

use dash_commerce::order::Order;
use dash_commerce::CommerceError;
use dash_payments::PaymentError;
use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur while placing or paying for an order.
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Cart or order validation failed; user-correctable.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Payment initiation or provider failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Backend persistence call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The order header was created but the line items failed to attach.
    ///
    /// Surfaced distinctly so the caller retries attaching items to the
    /// existing order instead of creating a duplicate. The cart is kept
    /// until the retry succeeds.
    #[error("Order created but line items failed to attach: {reason}")]
    PartialCreation {
        /// The order whose header exists server-side.
        order: Box<Order>,
        /// What went wrong attaching the items.
        reason: String,
    },

    /// Invalid checkout configuration.
    #[error("Invalid checkout configuration: {0}")]
    Config(String),
}
