//! Order and payment domain types and logic for CampusDash.
//!
//! This crate provides the pure domain core of the campus errand-delivery
//! platform:
//!
//! - **Money**: minor-unit monetary values with currency
//! - **Cart**: shopping cart with line items and derived totals
//! - **Order**: immutable order snapshots with a status lifecycle
//! - **Fees**: the single canonical totals calculator
//!
//! # Example
//!
//! ```rust,ignore
//! use dash_commerce::prelude::*;
//!
//! let mut cart = Cart::new(SessionId::new("session-1"));
//! cart.add_item(
//!     LineItemKind::Catalog {
//!         item_id: ItemId::new("jollof"),
//!         name: "Jollof rice".to_string(),
//!         unit_price: Money::new(1500, Currency::GHS),
//!         unit: Some("plate".to_string()),
//!     },
//!     2,
//!     None,
//!     &FeeSchedule::default(),
//!     20,
//! )?;
//! cart.set_delivery_address("Unity Hall, Room 204");
//!
//! let draft = build_order(
//!     &cart,
//!     PaymentMethod::MobileMoney,
//!     &FeeSchedule::default(),
//!     Money::new(1000, Currency::GHS),
//!     None,
//! )?;
//! println!("Total: {}", draft.totals.total.display());
//! ```

pub mod cart;
pub mod error;
pub mod ids;
pub mod method;
pub mod money;
pub mod order;

pub use error::CommerceError;
pub use ids::*;
pub use method::PaymentMethod;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::method::PaymentMethod;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{
        compute_totals, method_surcharge, Cart, FeeSchedule, LineItem, LineItemKind,
        MethodSurcharge, TotalsBreakdown, MAX_QUANTITY_PER_ITEM,
    };

    // Order
    pub use crate::order::{
        build_order, Order, OrderDraft, OrderLineItem, OrderStatus, PaymentStatus,
    };
}
