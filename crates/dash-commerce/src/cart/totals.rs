//! Canonical fee and totals calculator.
//!
//! Every place that shows or charges money goes through [`compute_totals`]
//! (or the [`method_surcharge`] helper on already-frozen components), so
//! the cart, checkout, and payment amounts can never disagree.

use crate::cart::LineItem;
use crate::error::CommerceError;
use crate::method::PaymentMethod;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Surcharge applied for a payment method: a flat part plus a percentage
/// of the subtotal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MethodSurcharge {
    /// Flat component in minor units.
    pub flat: Money,
    /// Percentage of the subtotal (e.g., 1.95 for 1.95%).
    pub percent: f64,
}

impl MethodSurcharge {
    /// A zero surcharge.
    pub fn free(currency: Currency) -> Self {
        Self {
            flat: Money::zero(currency),
            percent: 0.0,
        }
    }

    /// Compute the surcharge for a given subtotal.
    ///
    /// The percentage part rounds to the nearest minor unit here and is
    /// never re-rounded downstream.
    pub fn amount(&self, subtotal: Money) -> Money {
        let percent_part = subtotal.percentage(self.percent);
        self.flat
            .try_add(&percent_part)
            .unwrap_or_else(|| Money::zero(subtotal.currency))
    }
}

/// Platform fee configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeSchedule {
    /// Flat delivery fee per order.
    pub delivery_fee: Money,
    /// Platform commission as a fraction of the subtotal (e.g., 0.10).
    pub service_fee_rate: f64,
    /// Surcharge for card payments.
    pub card_surcharge: MethodSurcharge,
    /// Surcharge for mobile-money payments.
    pub momo_surcharge: MethodSurcharge,
}

impl FeeSchedule {
    /// Surcharge configuration for a payment method. Cash carries none.
    pub fn surcharge_for(&self, method: PaymentMethod) -> MethodSurcharge {
        match method {
            PaymentMethod::Card => self.card_surcharge,
            PaymentMethod::MobileMoney => self.momo_surcharge,
            PaymentMethod::Cash => MethodSurcharge::free(self.delivery_fee.currency),
        }
    }

    pub fn currency(&self) -> Currency {
        self.delivery_fee.currency
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let currency = Currency::GHS;
        Self {
            delivery_fee: Money::new(500, currency),
            service_fee_rate: 0.10,
            card_surcharge: MethodSurcharge {
                flat: Money::zero(currency),
                percent: 1.95,
            },
            momo_surcharge: MethodSurcharge {
                flat: Money::zero(currency),
                percent: 1.0,
            },
        }
    }
}

/// Complete monetary breakdown for a cart or order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TotalsBreakdown {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Platform commission on the subtotal.
    pub service_fee: Money,
    /// Flat delivery fee.
    pub delivery_fee: Money,
    /// Payment-method surcharge (zero when no method is chosen yet).
    pub method_surcharge: Money,
    /// Grand total: subtotal + service + delivery + surcharge.
    pub total: Money,
}

impl TotalsBreakdown {
    /// An empty breakdown in the given currency.
    pub fn empty(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            subtotal: zero,
            service_fee: zero,
            delivery_fee: zero,
            method_surcharge: zero,
            total: zero,
        }
    }
}

/// Compute the full monetary breakdown for a set of line items.
///
/// The subtotal is summed in minor units (no per-line rounding), the
/// service fee rounds once at computation, and the surcharge is added for
/// the chosen method (`None` while the cart has no method selected).
/// Deterministic, no side effects.
pub fn compute_totals(
    lines: &[LineItem],
    schedule: &FeeSchedule,
    method: Option<PaymentMethod>,
) -> Result<TotalsBreakdown, CommerceError> {
    let currency = schedule.currency();

    let subtotal = Money::try_sum(lines.iter().map(|l| &l.total_price), currency)
        .ok_or(CommerceError::Overflow)?;

    let service_fee = subtotal.multiply_decimal(schedule.service_fee_rate);

    let method_surcharge = match method {
        Some(m) => schedule.surcharge_for(m).amount(subtotal),
        None => Money::zero(currency),
    };

    let total = subtotal
        .try_add(&service_fee)
        .and_then(|t| t.try_add(&schedule.delivery_fee))
        .and_then(|t| t.try_add(&method_surcharge))
        .ok_or(CommerceError::Overflow)?;

    Ok(TotalsBreakdown {
        subtotal,
        service_fee,
        delivery_fee: schedule.delivery_fee,
        method_surcharge,
        total,
    })
}

/// Surcharge for a method against an already-frozen subtotal.
///
/// Used when charging an existing order with a method other than the one
/// it was built with; the frozen subtotal/service/delivery components are
/// reused and only the surcharge is recomputed.
pub fn method_surcharge(
    subtotal: Money,
    schedule: &FeeSchedule,
    method: PaymentMethod,
) -> Money {
    schedule.surcharge_for(method).amount(subtotal)
}
