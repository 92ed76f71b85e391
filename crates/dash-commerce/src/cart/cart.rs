//! Cart and line item types.

use crate::cart::{compute_totals, FeeSchedule, TotalsBreakdown};
use crate::error::CommerceError;
use crate::ids::{CartId, ItemId, LineItemId, SessionId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 99;

/// What a line item refers to.
///
/// A line is either a priced catalog entry or a free-form errand with a
/// student-set budget standing in for the unit price. The two are distinct
/// variants by construction; there is no structural "is it a catalog item"
/// sniffing anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItemKind {
    /// A catalog item with a known price.
    Catalog {
        /// Catalog item ID.
        item_id: ItemId,
        /// Item name (denormalized for display).
        name: String,
        /// Price per unit.
        unit_price: Money,
        /// Sale unit (e.g., "plate", "bottle").
        unit: Option<String>,
    },
    /// A free-form errand item the runner shops for.
    Custom {
        /// What the student asked for.
        name: String,
        /// Budget per unit the student is willing to spend.
        budget: Money,
    },
}

impl LineItemKind {
    /// The per-unit price this line is charged at.
    pub fn unit_price(&self) -> Money {
        match self {
            LineItemKind::Catalog { unit_price, .. } => *unit_price,
            LineItemKind::Custom { budget, .. } => *budget,
        }
    }

    /// Display name for the line.
    pub fn display_name(&self) -> &str {
        match self {
            LineItemKind::Catalog { name, .. } => name,
            LineItemKind::Custom { name, .. } => name,
        }
    }

    /// Catalog item ID, if this is a catalog line.
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            LineItemKind::Catalog { item_id, .. } => Some(item_id),
            LineItemKind::Custom { .. } => None,
        }
    }

    /// Whether two kinds describe the same thing: the same catalog item,
    /// or a custom item with the same name. Used to merge quantities
    /// instead of duplicating lines.
    pub fn merges_with(&self, other: &LineItemKind) -> bool {
        match (self, other) {
            (
                LineItemKind::Catalog { item_id: a, .. },
                LineItemKind::Catalog { item_id: b, .. },
            ) => a == b,
            (LineItemKind::Custom { name: a, .. }, LineItemKind::Custom { name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Unique line item identifier.
    pub id: LineItemId,
    /// What this line refers to.
    pub kind: LineItemKind,
    /// Quantity.
    pub quantity: i64,
    /// Student notes for the runner (e.g., "no pepper").
    pub notes: Option<String>,
    /// Total price (unit price × quantity). Always recomputed from its
    /// parts, never mutated independently.
    pub total_price: Money,
}

impl LineItem {
    /// Create a new line item.
    pub fn new(
        kind: LineItemKind,
        quantity: i64,
        notes: Option<String>,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if kind.unit_price().is_negative() {
            return Err(CommerceError::UnpricedItem(kind.display_name().to_string()));
        }
        let total_price = kind
            .unit_price()
            .try_multiply(quantity)
            .ok_or(CommerceError::Overflow)?;
        Ok(Self {
            id: LineItemId::generate(),
            kind,
            quantity,
            notes,
            total_price,
        })
    }

    /// Update the total price based on quantity.
    pub fn update_total(&mut self) -> Result<(), CommerceError> {
        self.total_price = self
            .kind
            .unit_price()
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)?;
        Ok(())
    }
}

/// A student's shopping cart.
///
/// Owned by one session. The four monetary fields in [`Cart::totals`] are
/// derived and re-established synchronously after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    /// Owning session.
    pub session_id: SessionId,
    /// Items in the cart, in insertion order.
    pub items: Vec<LineItem>,
    /// Free-text delivery address.
    pub delivery_address: String,
    /// Free-text special instructions for the runner.
    pub instructions: String,
    /// Cart currency.
    pub currency: Currency,
    /// Derived totals; all zero while the cart is empty.
    pub totals: TotalsBreakdown,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Cart {
    /// Create a new empty cart for a session.
    pub fn new(session_id: SessionId) -> Self {
        let now = current_timestamp();
        let currency = Currency::default();
        Self {
            id: CartId::generate(),
            session_id,
            items: Vec::new(),
            delivery_address: String::new(),
            instructions: String::new(),
            currency,
            totals: TotalsBreakdown::empty(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an item to the cart.
    ///
    /// An equivalent line (same catalog item, or same custom name) has the
    /// quantity merged in instead of a duplicate line being appended. The
    /// line cap applies only to genuinely new lines.
    pub fn add_item(
        &mut self,
        kind: LineItemKind,
        quantity: i64,
        notes: Option<String>,
        schedule: &FeeSchedule,
        max_lines: usize,
    ) -> Result<LineItemId, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }

        if let Some(existing) = self.items.iter_mut().find(|i| i.kind.merges_with(&kind)) {
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::Overflow)?;

            if new_quantity > MAX_QUANTITY_PER_ITEM {
                return Err(CommerceError::QuantityExceedsLimit(
                    new_quantity,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }

            existing.quantity = new_quantity;
            existing.update_total()?;
            let id = existing.id.clone();
            self.recompute(schedule)?;
            return Ok(id);
        }

        if self.items.len() >= max_lines {
            return Err(CommerceError::CartFull(max_lines));
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        let item = LineItem::new(kind, quantity, notes)?;
        let id = item.id.clone();
        self.items.push(item);
        self.recompute(schedule)?;
        Ok(id)
    }

    /// Update a line's quantity.
    ///
    /// A quantity of zero or less removes the line, exactly as
    /// [`Cart::remove_item`] would.
    pub fn update_quantity(
        &mut self,
        line_id: &LineItemId,
        quantity: i64,
        schedule: &FeeSchedule,
    ) -> Result<bool, CommerceError> {
        if quantity <= 0 {
            return Ok(self.remove_item(line_id.as_str(), schedule)?);
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        if let Some(item) = self.items.iter_mut().find(|i| &i.id == line_id) {
            item.quantity = quantity;
            item.update_total()?;
            self.recompute(schedule)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove a line by line id or by the embedded catalog item id.
    ///
    /// Removing something that is not in the cart is a successful no-op.
    pub fn remove_item(
        &mut self,
        id: &str,
        schedule: &FeeSchedule,
    ) -> Result<bool, CommerceError> {
        let len_before = self.items.len();
        self.items.retain(|i| {
            i.id.as_str() != id && i.kind.item_id().map(|c| c.as_str()) != Some(id)
        });
        let removed = self.items.len() < len_before;
        if removed {
            self.recompute(schedule)?;
        }
        Ok(removed)
    }

    /// Clear all items and reset totals.
    pub fn clear(&mut self) {
        self.items.clear();
        self.totals = TotalsBreakdown::empty(self.currency);
        self.updated_at = current_timestamp();
    }

    /// Set the delivery address.
    pub fn set_delivery_address(&mut self, address: impl Into<String>) {
        self.delivery_address = address.into();
        self.updated_at = current_timestamp();
    }

    /// Set the special instructions.
    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.instructions = instructions.into();
        self.updated_at = current_timestamp();
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Get number of lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a line by ID.
    pub fn get_line(&self, line_id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.id == line_id)
    }

    /// Whether the cart is eligible for checkout: non-empty, meets the
    /// minimum order total, and has a delivery address.
    pub fn can_checkout(&self, minimum_order: Money) -> bool {
        !self.is_empty()
            && self.totals.total.amount_cents >= minimum_order.amount_cents
            && !self.delivery_address.trim().is_empty()
    }

    /// Re-derive the stored totals from the current lines.
    fn recompute(&mut self, schedule: &FeeSchedule) -> Result<(), CommerceError> {
        self.totals = if self.items.is_empty() {
            TotalsBreakdown::empty(self.currency)
        } else {
            compute_totals(&self.items, schedule, None)?
        };
        self.updated_at = current_timestamp();
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> FeeSchedule {
        FeeSchedule::default()
    }

    fn catalog(id: &str, price_cents: i64) -> LineItemKind {
        LineItemKind::Catalog {
            item_id: ItemId::new(id),
            name: format!("Item {}", id),
            unit_price: Money::new(price_cents, Currency::GHS),
            unit: None,
        }
    }

    fn custom(name: &str, budget_cents: i64) -> LineItemKind {
        LineItemKind::Custom {
            name: name.to_string(),
            budget: Money::new(budget_cents, Currency::GHS),
        }
    }

    fn assert_subtotal_invariant(cart: &Cart) {
        let expected: i64 = cart.items.iter().map(|i| i.total_price.amount_cents).sum();
        assert_eq!(cart.totals.subtotal.amount_cents, expected);
        assert_eq!(
            cart.totals.total.amount_cents,
            cart.totals.subtotal.amount_cents
                + cart.totals.service_fee.amount_cents
                + cart.totals.delivery_fee.amount_cents
        );
    }

    #[test]
    fn test_cart_creation() {
        let cart = Cart::new(SessionId::new("session-123"));
        assert!(cart.is_empty());
        assert!(cart.totals.total.is_zero());
    }

    #[test]
    fn test_add_item_recomputes_totals() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(catalog("jollof", 1500), 2, None, &schedule(), 20)
            .unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.totals.subtotal.amount_cents, 3000);
        assert_subtotal_invariant(&cart);
    }

    #[test]
    fn test_add_same_catalog_item_merges() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(catalog("jollof", 1500), 2, None, &schedule(), 20)
            .unwrap();
        cart.add_item(catalog("jollof", 1500), 3, None, &schedule(), 20)
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.totals.subtotal.amount_cents, 7500);
    }

    #[test]
    fn test_add_same_custom_name_merges() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(custom("AA batteries", 800), 1, None, &schedule(), 20)
            .unwrap();
        cart.add_item(custom("AA batteries", 800), 1, None, &schedule(), 20)
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_catalog_and_custom_never_merge() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(catalog("water", 300), 1, None, &schedule(), 20)
            .unwrap();
        cart.add_item(custom("water", 300), 1, None, &schedule(), 20)
            .unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_invariant_holds_after_every_mutation() {
        let mut cart = Cart::new(SessionId::new("s"));
        let s = schedule();

        let a = cart.add_item(catalog("a", 1200), 2, None, &s, 20).unwrap();
        assert_subtotal_invariant(&cart);

        cart.add_item(custom("b", 950), 1, None, &s, 20).unwrap();
        assert_subtotal_invariant(&cart);

        cart.update_quantity(&a, 5, &s).unwrap();
        assert_subtotal_invariant(&cart);

        cart.remove_item(a.as_str(), &s).unwrap();
        assert_subtotal_invariant(&cart);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new(SessionId::new("s"));
        let s = schedule();
        let id = cart.add_item(catalog("a", 1000), 2, None, &s, 20).unwrap();

        cart.update_quantity(&id, 0, &s).unwrap();
        assert!(cart.is_empty());
        assert!(cart.totals.total.is_zero());
    }

    #[test]
    fn test_remove_by_catalog_id() {
        let mut cart = Cart::new(SessionId::new("s"));
        let s = schedule();
        cart.add_item(catalog("waakye", 1000), 1, None, &s, 20).unwrap();

        assert!(cart.remove_item("waakye", &s).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new(SessionId::new("s"));
        assert!(!cart.remove_item("nothing", &schedule()).unwrap());
    }

    #[test]
    fn test_line_cap() {
        let mut cart = Cart::new(SessionId::new("s"));
        let s = schedule();
        cart.add_item(catalog("a", 100), 1, None, &s, 2).unwrap();
        cart.add_item(catalog("b", 100), 1, None, &s, 2).unwrap();

        let result = cart.add_item(catalog("c", 100), 1, None, &s, 2);
        assert!(matches!(result, Err(CommerceError::CartFull(2))));

        // Merging into an existing line is still allowed at capacity.
        cart.add_item(catalog("a", 100), 1, None, &s, 2).unwrap();
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_invalid_quantity() {
        let mut cart = Cart::new(SessionId::new("s"));
        let result = cart.add_item(catalog("a", 100), 0, None, &schedule(), 20);
        assert!(matches!(result, Err(CommerceError::InvalidQuantity(0))));
    }

    #[test]
    fn test_can_checkout() {
        let mut cart = Cart::new(SessionId::new("s"));
        let s = schedule();
        let minimum = Money::new(1000, Currency::GHS);

        assert!(!cart.can_checkout(minimum));

        cart.add_item(catalog("a", 2000), 1, None, &s, 20).unwrap();
        // Address still blank.
        assert!(!cart.can_checkout(minimum));

        cart.set_delivery_address("Unity Hall, Room 204");
        assert!(cart.can_checkout(minimum));
    }

    #[test]
    fn test_below_minimum_cannot_checkout() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(catalog("a", 100), 1, None, &schedule(), 20)
            .unwrap();
        cart.set_delivery_address("Katanga Hall");

        // Total is 100 + 10 service + 500 delivery = 610; minimum 10_000.
        assert!(!cart.can_checkout(Money::new(10_000, Currency::GHS)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = Cart::new(SessionId::new("s"));
        cart.add_item(custom("phone credit", 1000), 1, None, &schedule(), 20)
            .unwrap();
        cart.set_delivery_address("Africa Hall");

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart, restored);
    }
}
