//! Order persistence backend interface.

use async_trait::async_trait;
use dash_commerce::order::{Order, OrderDraft, OrderLineItem, OrderStatus, PaymentStatus};
use dash_commerce::{OrderId, RunnerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the backend collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend unreachable or the call failed in transit.
    #[error("Backend unreachable: {0}")]
    Network(String),

    /// Backend rejected the request.
    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(String),
}

/// Extra fields accompanying a status update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdate {
    /// Runner claiming or working the order.
    pub runner_id: Option<RunnerId>,
    /// New payment status, when the update is payment-driven.
    pub payment_status: Option<PaymentStatus>,
    /// Free-text note (e.g., a cancellation reason).
    pub note: Option<String>,
}

impl StatusUpdate {
    /// An update carrying only a payment status change.
    pub fn payment(status: PaymentStatus) -> Self {
        Self {
            payment_status: Some(status),
            ..Self::default()
        }
    }
}

/// The fulfillment backend collaborator.
///
/// All calls are fallible network calls. Creating an order takes two
/// calls (header, then line items) with no atomicity between them; the
/// placement flow in this crate owns the resulting failure semantics.
/// Order ids and human-readable order numbers are assigned here and are
/// opaque to the engine.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Create the order header and assign it an id and order number.
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, BackendError>;

    /// Attach line items to an existing order.
    async fn add_order_line_items(
        &self,
        order_id: &OrderId,
        items: &[OrderLineItem],
    ) -> Result<(), BackendError>;

    /// Record a status change, with optional extra fields.
    ///
    /// The transition has already been validated against the status
    /// machine by the caller; payment-only updates pass the current
    /// status unchanged.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        extra: StatusUpdate,
    ) -> Result<(), BackendError>;

    /// Fetch an order.
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, BackendError>;
}
