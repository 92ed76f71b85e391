//! Cart-to-order conversion.

use crate::cart::{compute_totals, Cart, FeeSchedule};
use crate::error::CommerceError;
use crate::ids::UserId;
use crate::method::PaymentMethod;
use crate::money::Money;
use crate::order::{OrderDraft, OrderLineItem, OrderStatus, PaymentStatus};

/// Validate a cart and freeze it into an [`OrderDraft`].
///
/// Validation failures are typed errors for the caller to surface inline;
/// nothing here panics. On success the draft owns deep copies of the
/// lines and totals computed for the chosen method, so later cart
/// mutations cannot retroactively alter it. The caller must not clear the
/// cart until the backend has confirmed the full creation sequence.
pub fn build_order(
    cart: &Cart,
    method: PaymentMethod,
    schedule: &FeeSchedule,
    minimum_order: Money,
    user_id: Option<UserId>,
) -> Result<OrderDraft, CommerceError> {
    if cart.is_empty() {
        return Err(CommerceError::EmptyCart);
    }
    if cart.delivery_address.trim().is_empty() {
        return Err(CommerceError::MissingDeliveryAddress);
    }
    for line in &cart.items {
        if !line.kind.unit_price().is_positive() {
            return Err(CommerceError::UnpricedItem(
                line.kind.display_name().to_string(),
            ));
        }
    }

    let totals = compute_totals(&cart.items, schedule, Some(method))?;
    if totals.total.amount_cents < minimum_order.amount_cents {
        return Err(CommerceError::BelowMinimumOrder {
            total: totals.total.display(),
            minimum: minimum_order.display(),
        });
    }

    let line_items = cart.items.iter().map(OrderLineItem::from_cart_line).collect();

    Ok(OrderDraft {
        user_id,
        line_items,
        totals,
        delivery_address: cart.delivery_address.clone(),
        instructions: cart.instructions.clone(),
        payment_method: method,
        currency: cart.currency,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
    })
}
