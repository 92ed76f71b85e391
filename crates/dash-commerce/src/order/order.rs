//! Order types.
//!
//! An order is an immutable-after-creation snapshot of a cart. The
//! monetary fields are frozen at creation time; catalog price changes
//! after checkout never touch a placed order.

use crate::cart::{method_surcharge, FeeSchedule, LineItem, LineItemKind, TotalsBreakdown};
use crate::error::CommerceError;
use crate::ids::{LineItemId, OrderId, RunnerId, UserId};
use crate::method::PaymentMethod;
use crate::money::{Currency, Money};
use crate::order::{OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};

/// A line item frozen into an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    /// Line identifier carried over from the cart.
    pub id: LineItemId,
    /// What this line refers to.
    pub kind: LineItemKind,
    /// Quantity ordered.
    pub quantity: i64,
    /// Student notes for the runner.
    pub notes: Option<String>,
    /// Unit price at order time.
    pub unit_price: Money,
    /// Total price for this line at order time.
    pub total_price: Money,
}

impl OrderLineItem {
    /// Freeze a cart line into an order line.
    pub fn from_cart_line(line: &LineItem) -> Self {
        Self {
            id: line.id.clone(),
            kind: line.kind.clone(),
            quantity: line.quantity,
            notes: line.notes.clone(),
            unit_price: line.kind.unit_price(),
            total_price: line.total_price,
        }
    }
}

/// An order as assembled by the core, before the backend has assigned it
/// an identity.
///
/// The backend collaborator owns id and order-number generation; the core
/// treats both as opaque and never derives or guesses them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDraft {
    /// Placing student (None for guest sessions).
    pub user_id: Option<UserId>,
    /// Deep-copied line items.
    pub line_items: Vec<OrderLineItem>,
    /// Totals frozen for the chosen payment method.
    pub totals: TotalsBreakdown,
    /// Delivery address at order time.
    pub delivery_address: String,
    /// Special instructions at order time.
    pub instructions: String,
    /// Chosen payment method.
    pub payment_method: PaymentMethod,
    /// Order currency.
    pub currency: Currency,
    /// Always `Pending` at creation.
    pub status: OrderStatus,
    /// Always `Pending` at creation.
    pub payment_status: PaymentStatus,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Backend-assigned identifier.
    pub id: OrderId,
    /// Backend-assigned human-readable order number.
    pub order_number: String,
    /// Placing student.
    pub user_id: Option<UserId>,
    /// Runner who claimed the order, once accepted.
    pub runner_id: Option<RunnerId>,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Items in the order.
    pub line_items: Vec<OrderLineItem>,
    /// Totals frozen at creation time. Never change afterwards.
    pub totals: TotalsBreakdown,
    /// Delivery address.
    pub delivery_address: String,
    /// Special instructions.
    pub instructions: String,
    /// Chosen payment method.
    pub payment_method: PaymentMethod,
    /// Order currency.
    pub currency: Currency,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
    /// Unix timestamp when a runner accepted.
    pub accepted_at: Option<i64>,
    /// Unix timestamp when delivery was confirmed.
    pub completed_at: Option<i64>,
    /// Unix timestamp when cancelled.
    pub cancelled_at: Option<i64>,
}

impl Order {
    /// Materialize an order from a draft and backend-assigned identity.
    pub fn from_draft(draft: OrderDraft, id: OrderId, order_number: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id,
            order_number: order_number.into(),
            user_id: draft.user_id,
            runner_id: None,
            status: draft.status,
            payment_status: draft.payment_status,
            line_items: draft.line_items,
            totals: draft.totals,
            delivery_address: draft.delivery_address,
            instructions: draft.instructions,
            payment_method: draft.payment_method,
            currency: draft.currency,
            created_at: now,
            updated_at: now,
            accepted_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Get total item count.
    pub fn item_count(&self) -> i64 {
        self.line_items.iter().map(|i| i.quantity).sum()
    }

    /// Check if the order is paid.
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move the order to a new status through the transition table.
    ///
    /// Stamps the matching timestamp on entry to `Accepted`, `Completed`,
    /// and `Cancelled`.
    pub fn update_status(&mut self, next: OrderStatus) -> Result<(), CommerceError> {
        self.status = self.status.transition(next)?;
        let now = current_timestamp();
        match next {
            OrderStatus::Accepted => self.accepted_at = Some(now),
            OrderStatus::Completed => self.completed_at = Some(now),
            OrderStatus::Cancelled => self.cancelled_at = Some(now),
            _ => {}
        }
        self.updated_at = now;
        Ok(())
    }

    /// Cancel the order, honoring the cancellation window.
    pub fn cancel(&mut self) -> Result<(), CommerceError> {
        self.update_status(OrderStatus::Cancelled)
    }

    /// Apply a successful payment confirmation.
    ///
    /// Idempotent: a duplicate confirmation for an already-paid order
    /// returns `Ok(false)` and changes nothing. A confirmation for a
    /// refunded order is illegal.
    pub fn apply_payment_success(&mut self) -> Result<bool, CommerceError> {
        if self.payment_status == PaymentStatus::Paid {
            return Ok(false);
        }
        self.payment_status = self.payment_status.transition(PaymentStatus::Paid)?;
        self.updated_at = current_timestamp();
        Ok(true)
    }

    /// Apply a payment failure.
    ///
    /// Idempotent on an already-failed order.
    pub fn apply_payment_failure(&mut self) -> Result<bool, CommerceError> {
        if self.payment_status == PaymentStatus::Failed {
            return Ok(false);
        }
        self.payment_status = self.payment_status.transition(PaymentStatus::Failed)?;
        self.updated_at = current_timestamp();
        Ok(true)
    }

    /// Mark a paid order refunded.
    pub fn mark_refunded(&mut self) -> Result<(), CommerceError> {
        self.payment_status = self.payment_status.transition(PaymentStatus::Refunded)?;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// The amount to charge when paying this order with `method`.
    ///
    /// Reuses the frozen subtotal/service/delivery components and
    /// recomputes only the surcharge, so retrying with a different method
    /// never re-derives the order's totals.
    pub fn charge_total(&self, method: PaymentMethod, schedule: &FeeSchedule) -> Money {
        let surcharge = method_surcharge(self.totals.subtotal, schedule, method);
        let base = self
            .totals
            .subtotal
            .try_add(&self.totals.service_fee)
            .and_then(|t| t.try_add(&self.totals.delivery_fee));
        match base.and_then(|b| b.try_add(&surcharge)) {
            Some(total) => total,
            None => self.totals.total,
        }
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
