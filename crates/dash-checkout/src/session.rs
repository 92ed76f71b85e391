//! Session-scoped checkout engine.

use crate::backend::{OrderBackend, StatusUpdate};
use crate::cart_store::CartStore;
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::placement::OrderPlacement;
use dash_commerce::order::{Order, OrderStatus};
use dash_commerce::{OrderId, PaymentMethod, SessionId, TransactionId, UserId};
use dash_payments::{
    CancelToken, CustomerContact, PaymentOrchestrator, PaymentOutcome, PaymentProvider,
    ProviderPaymentStatus, StatusReport,
};
use dash_store::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything one student session needs to shop, check out, and pay.
///
/// Owned by the caller with explicit construction and teardown; there is
/// no module-level state. The cart, the placement flow, and the payment
/// orchestrator all share this session's configuration, so every place
/// that touches money computes it the same way.
pub struct SessionContext {
    session_id: SessionId,
    config: CheckoutConfig,
    cart: CartStore,
    backend: Arc<dyn OrderBackend>,
    placement: OrderPlacement,
    orchestrator: PaymentOrchestrator,
    active_payment: Option<CancelToken>,
}

impl SessionContext {
    /// Construct the engine for a session, hydrating the persisted cart.
    pub async fn start(
        session_id: SessionId,
        storage: Arc<dyn KeyValueStore>,
        backend: Arc<dyn OrderBackend>,
        provider: Arc<dyn PaymentProvider>,
        config: CheckoutConfig,
    ) -> Self {
        let cart = CartStore::hydrate(storage, session_id.clone(), config.clone()).await;
        let orchestrator = PaymentOrchestrator::new(provider, config.poll.policy());
        Self {
            session_id,
            cart,
            placement: OrderPlacement::new(Arc::clone(&backend)),
            backend,
            orchestrator,
            config,
            active_payment: None,
        }
    }

    /// The owning session id.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The session's cart.
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The session's cart, mutably.
    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    /// Place an order from the current cart.
    pub async fn place_order(
        &mut self,
        method: PaymentMethod,
        user_id: Option<UserId>,
    ) -> Result<Order, CheckoutError> {
        self.placement.place(&mut self.cart, method, user_id).await
    }

    /// Retry attaching line items after a partial creation.
    pub async fn retry_line_items(&mut self, order: &Order) -> Result<(), CheckoutError> {
        self.placement.retry_line_items(&mut self.cart, order).await
    }

    /// Pay for an order, driving the attempt to a terminal outcome and
    /// applying the result to the order and the backend.
    ///
    /// A retry after a failed attempt goes through here again, with the
    /// same or another method, against the same order.
    pub async fn pay(
        &mut self,
        order: &mut Order,
        method: PaymentMethod,
        contact: &CustomerContact,
    ) -> Result<PaymentOutcome, CheckoutError> {
        let cancel = CancelToken::new();
        self.active_payment = Some(cancel.clone());
        let result = self
            .orchestrator
            .pay(order, method, contact, &self.config.fees, &cancel)
            .await;
        self.active_payment = None;

        let outcome = result?;
        self.apply_outcome(order, &outcome).await?;
        Ok(outcome)
    }

    /// Cancellation handle for the payment currently polling, if any.
    ///
    /// Presentation code cancels this when the user navigates away.
    pub fn active_payment(&self) -> Option<&CancelToken> {
        self.active_payment.as_ref()
    }

    /// One immediate status check for a timed-out attempt, backing the
    /// manual "check back" affordance. Applies a resolved status to the
    /// order the same idempotent way the polling loop does.
    pub async fn refresh_payment(
        &self,
        order: &mut Order,
        transaction_id: &TransactionId,
    ) -> Result<StatusReport, CheckoutError> {
        let report = self.orchestrator.check_once(transaction_id).await?;
        match report.status {
            ProviderPaymentStatus::Successful => {
                if order.apply_payment_success()? {
                    self.sync_payment_status(order).await?;
                }
            }
            ProviderPaymentStatus::Failed => {
                if order.apply_payment_failure()? {
                    self.sync_payment_status(order).await?;
                }
            }
            ProviderPaymentStatus::Pending => {
                debug!(transaction = %transaction_id, "payment still pending on manual refresh");
            }
        }
        Ok(report)
    }

    /// Re-fetch an order from the backend, for the order tracking
    /// screen's manual refresh.
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, CheckoutError> {
        Ok(self.backend.get_order(order_id).await?)
    }

    /// Cancel an order, honoring the cancellation window.
    pub async fn cancel_order(&self, order: &mut Order) -> Result<(), CheckoutError> {
        order.cancel()?;
        self.backend
            .update_order_status(&order.id, OrderStatus::Cancelled, StatusUpdate::default())
            .await?;
        Ok(())
    }

    /// Tear the session down, abandoning any in-flight payment poll.
    pub fn end(mut self) {
        if let Some(token) = self.active_payment.take() {
            token.cancel();
        }
        debug!(session = %self.session_id, "session ended");
    }

    /// Apply a payment outcome to the order and sync the backend.
    async fn apply_outcome(
        &self,
        order: &mut Order,
        outcome: &PaymentOutcome,
    ) -> Result<(), CheckoutError> {
        match outcome {
            PaymentOutcome::Paid(_) => {
                // Idempotent: a duplicate confirmation changes nothing
                // and syncs nothing.
                if order.apply_payment_success()? {
                    self.sync_payment_status(order).await?;
                }
            }
            PaymentOutcome::Failed { reason, .. } => {
                if order.apply_payment_failure()? {
                    self.sync_payment_status(order).await?;
                }
                warn!(
                    order = %order.id,
                    reason = reason.as_deref().unwrap_or("unspecified"),
                    "payment failed; order can be retried"
                );
            }
            PaymentOutcome::TimedOut(attempt) => {
                // Not a failure: the charge may still settle. The order
                // keeps its pending payment status.
                warn!(
                    order = %order.id,
                    transaction = %attempt.transaction_id,
                    "payment unresolved; user should check back"
                );
            }
            PaymentOutcome::CashOnDelivery | PaymentOutcome::Cancelled(_) => {}
        }
        Ok(())
    }

    /// Push the order's payment status to the backend. The fulfillment
    /// status is passed through unchanged.
    async fn sync_payment_status(&self, order: &Order) -> Result<(), CheckoutError> {
        self.backend
            .update_order_status(
                &order.id,
                order.status,
                StatusUpdate::payment(order.payment_status),
            )
            .await?;
        Ok(())
    }
}
