//! Shopping cart module.
//!
//! Contains the cart, line items, and the canonical fee calculator.

mod cart;
mod totals;

pub use cart::{Cart, LineItem, LineItemKind, MAX_QUANTITY_PER_ITEM};
pub use totals::{
    compute_totals, method_surcharge, FeeSchedule, MethodSurcharge, TotalsBreakdown,
};
