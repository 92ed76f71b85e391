//! Order placement flow.

use crate::backend::OrderBackend;
use crate::cart_store::CartStore;
use crate::error::CheckoutError;
use dash_commerce::order::{build_order, Order};
use dash_commerce::{PaymentMethod, UserId};
use std::sync::Arc;
use tracing::{info, warn};

/// Turns a checkout-eligible cart into a placed order.
///
/// Creation is two backend calls with no atomicity between them: the
/// header first, then the line items. The cart is cleared only after
/// both succeed, so a failure anywhere leaves the student's items
/// intact for a retry.
pub struct OrderPlacement {
    backend: Arc<dyn OrderBackend>,
}

impl OrderPlacement {
    /// Create a placement flow over a backend.
    pub fn new(backend: Arc<dyn OrderBackend>) -> Self {
        Self { backend }
    }

    /// Validate the cart, create the order, and clear the cart.
    ///
    /// A failure attaching line items surfaces as
    /// [`CheckoutError::PartialCreation`] carrying the created order;
    /// retry with [`OrderPlacement::retry_line_items`] rather than
    /// placing again, which would duplicate the header.
    pub async fn place(
        &self,
        cart: &mut CartStore,
        method: PaymentMethod,
        user_id: Option<UserId>,
    ) -> Result<Order, CheckoutError> {
        let config = cart.config();
        let draft = build_order(
            cart.cart(),
            method,
            &config.fees,
            config.minimum_order,
            user_id,
        )?;

        let order = self.backend.create_order(&draft).await?;
        info!(
            order = %order.id,
            number = %order.order_number,
            total = %order.totals.total,
            "order header created"
        );

        if let Err(e) = self
            .backend
            .add_order_line_items(&order.id, &order.line_items)
            .await
        {
            warn!(
                order = %order.id,
                error = %e,
                "line items failed to attach; cart kept for retry"
            );
            return Err(CheckoutError::PartialCreation {
                reason: e.to_string(),
                order: Box::new(order),
            });
        }

        cart.clear().await;
        info!(order = %order.id, "order placed; cart cleared");
        Ok(order)
    }

    /// Re-attach line items after a partial creation, then clear the cart.
    pub async fn retry_line_items(
        &self,
        cart: &mut CartStore,
        order: &Order,
    ) -> Result<(), CheckoutError> {
        self.backend
            .add_order_line_items(&order.id, &order.line_items)
            .await?;
        cart.clear().await;
        info!(order = %order.id, "line items attached on retry; cart cleared");
        Ok(())
    }
}
