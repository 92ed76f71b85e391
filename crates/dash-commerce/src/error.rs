//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in cart, order, and payment-status operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Delivery address is missing or blank.
    #[error("Delivery address is required")]
    MissingDeliveryAddress,

    /// Cart total is below the minimum order amount.
    #[error("Order total {total} is below the minimum of {minimum}")]
    BelowMinimumOrder { total: String, minimum: String },

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Cart is at its line-item capacity.
    #[error("Cart is full: limit is {0} items")]
    CartFull(usize),

    /// Line item has no resolvable positive price.
    #[error("Item has no price: {0}")]
    UnpricedItem(String),

    /// Line item not found in the cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Illegal order status transition.
    #[error("Illegal order transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    /// Illegal payment status transition.
    #[error("Illegal payment transition from {from} to {to}")]
    IllegalPaymentTransition { from: String, to: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
