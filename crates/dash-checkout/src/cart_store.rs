//! Session-scoped cart with persistence.

use crate::config::CheckoutConfig;
use dash_commerce::cart::{Cart, LineItemKind, TotalsBreakdown};
use dash_commerce::{CommerceError, LineItemId, SessionId};
use dash_store::{get_json, set_json, KeyValueStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// The student session's cart, backed by durable storage.
///
/// The in-memory cart is authoritative: every mutation applies locally
/// first, then re-persists the whole record. A persistence failure is
/// logged and the mutation stands; the cart stays usable and the next
/// mutation rewrites the full state, so resync is best-effort.
pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    config: CheckoutConfig,
}

impl CartStore {
    /// Storage key for a session's cart.
    pub fn storage_key(session_id: &SessionId) -> String {
        format!("cart:{}", session_id)
    }

    /// Load the persisted cart for a session, or start empty.
    ///
    /// A corrupt or unreadable record is logged and discarded rather
    /// than wedging the session.
    pub async fn hydrate(
        storage: Arc<dyn KeyValueStore>,
        session_id: SessionId,
        config: CheckoutConfig,
    ) -> Self {
        let key = Self::storage_key(&session_id);
        let cart = match get_json::<Cart>(storage.as_ref(), &key).await {
            Ok(Some(cart)) => {
                debug!(session = %session_id, items = cart.line_count(), "restored persisted cart");
                cart
            }
            Ok(None) => Cart::new(session_id),
            Err(e) => {
                warn!(session = %session_id, error = %e, "failed to load persisted cart; starting empty");
                Cart::new(session_id)
            }
        };
        Self {
            cart,
            storage,
            key,
            config,
        }
    }

    /// Add an item, merging into an equivalent line when one exists.
    pub async fn add_item(
        &mut self,
        kind: LineItemKind,
        quantity: i64,
        notes: Option<String>,
    ) -> Result<LineItemId, CommerceError> {
        let id = self.cart.add_item(
            kind,
            quantity,
            notes,
            &self.config.fees,
            self.config.max_cart_lines,
        )?;
        self.persist().await;
        Ok(id)
    }

    /// Remove a line by line id or embedded catalog item id.
    pub async fn remove_item(&mut self, id: &str) -> Result<bool, CommerceError> {
        let removed = self.cart.remove_item(id, &self.config.fees)?;
        if removed {
            self.persist().await;
        }
        Ok(removed)
    }

    /// Update a line's quantity; zero or less removes it.
    pub async fn update_quantity(
        &mut self,
        line_id: &LineItemId,
        quantity: i64,
    ) -> Result<bool, CommerceError> {
        let changed = self
            .cart
            .update_quantity(line_id, quantity, &self.config.fees)?;
        if changed {
            self.persist().await;
        }
        Ok(changed)
    }

    /// Empty the cart and drop the persisted record.
    pub async fn clear(&mut self) {
        self.cart.clear();
        if let Err(e) = self.storage.remove(&self.key).await {
            warn!(key = %self.key, error = %e, "failed to clear persisted cart");
        }
    }

    /// Set the delivery address.
    pub async fn set_delivery_address(&mut self, address: impl Into<String>) {
        self.cart.set_delivery_address(address);
        self.persist().await;
    }

    /// Set the special instructions.
    pub async fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.cart.set_instructions(instructions);
        self.persist().await;
    }

    /// The current cart state.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Derived totals.
    pub fn totals(&self) -> &TotalsBreakdown {
        &self.cart.totals
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> i64 {
        self.cart.item_count()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Whether the cart is eligible for checkout.
    pub fn can_checkout(&self) -> bool {
        self.cart.can_checkout(self.config.minimum_order)
    }

    /// The active configuration.
    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Write the cart through to storage; failures are reported but
    /// never roll back the in-memory mutation.
    async fn persist(&self) {
        if let Err(e) = set_json(self.storage.as_ref(), &self.key, &self.cart).await {
            warn!(key = %self.key, error = %e, "cart persistence failed; will rewrite on next mutation");
        }
    }
}
