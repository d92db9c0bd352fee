//! # Cart
//!
//! The ordered list of line items and every rule that changes it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action                Operation              Cart Change            │
//! │  ─────────                ─────────              ───────────            │
//! │                                                                         │
//! │  "Add to cart" ─────────► add(product) ────────► push (qty 1)           │
//! │                             │ already present?                          │
//! │                             └──────────────────► increment(id)          │
//! │                                                                         │
//! │  "+" button ────────────► increment(id) ───────► qty += 1               │
//! │                                                                         │
//! │  "−" button ────────────► decrement(id) ───────► qty -= 1               │
//! │                                                   qty == 0 → removed    │
//! │                                                                         │
//! │  Unknown id on inc/dec ─► Err(ItemNotFound) ───► (no change)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Format
//! The cart serializes as a bare JSON array of [`LineItem`]s. Decoding is
//! lenient per entry (see [`Cart::from_json`]) so one bad record does not
//! cost the user the rest of their cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineItem, Product};
use crate::validation::{validate_line_item, validate_product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `id` (adding the same product increments it)
/// - Every present item has quantity ≥ 1 (reaching 0 removes the entry)
/// - At most [`MAX_CART_ITEMS`] items, each at most [`MAX_ITEM_QUANTITY`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

/// Result of decoding a persisted cart blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCart {
    pub cart: Cart,

    /// Entries that were skipped: not a line item, invalid, or a duplicate id.
    pub dropped: usize,

    /// Entries kept with their quantity lowered to [`MAX_ITEM_QUANTITY`].
    pub clamped: usize,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Line items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consumes the cart, returning its line items.
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Looks up a line item by identifier.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of distinct items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a product, or increments it if the id is already in the cart.
    ///
    /// When the id is present the descriptor's title, image and price are
    /// ignored; the entry keeps the values it was first added with.
    ///
    /// ## Returns
    /// The line item as it stands after the call.
    pub fn add(&mut self, product: &Product) -> CoreResult<LineItem> {
        if self.contains(&product.id) {
            return self.increment(&product.id);
        }

        validate_product(product)?;

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let item = LineItem::from_product(product);
        self.items.push(item.clone());
        Ok(item)
    }

    /// Increases an item's quantity by one.
    ///
    /// ## Errors
    /// - `ItemNotFound` if no item has this id
    /// - `QuantityTooLarge` if the item is already at the per-item limit
    pub fn increment(&mut self, id: &str) -> CoreResult<LineItem> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::not_found(id))?;

        let requested = item.quantity + 1;
        if requested > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        }

        item.quantity = requested;
        Ok(item.clone())
    }

    /// Decreases an item's quantity by one.
    ///
    /// ## Returns
    /// - `Some(item)` with the new quantity
    /// - `None` if the quantity reached zero and the entry was removed
    pub fn decrement(&mut self, id: &str) -> CoreResult<Option<LineItem>> {
        let index = self
            .position(id)
            .ok_or_else(|| CoreError::not_found(id))?;

        let item = &mut self.items[index];
        item.quantity -= 1;

        if item.quantity <= 0 {
            self.items.remove(index);
            return Ok(None);
        }

        Ok(Some(item.clone()))
    }

    /// Removes an item regardless of its quantity.
    pub fn remove(&mut self, id: &str) -> CoreResult<LineItem> {
        let index = self
            .position(id)
            .ok_or_else(|| CoreError::not_found(id))?;
        Ok(self.items.remove(index))
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of every line total.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    // =========================================================================
    // Persisted Format
    // =========================================================================

    /// Encodes the cart as the JSON array stored under the cart key.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(&self.items).map_err(|e| CoreError::Encode(e.to_string()))
    }

    /// Decodes a persisted cart blob.
    ///
    /// The blob must be a JSON array; anything else is a `Decode` error.
    /// Inside the array each entry is checked on its own and skipped when
    /// it:
    /// - is not a line item object (e.g. the `{}` placeholders some older
    ///   builds left behind when an item reached zero)
    /// - fails [`validate_line_item`] (empty id, quantity ≤ 0, ...)
    /// - repeats an id already seen (first occurrence wins)
    /// - would push the cart past [`MAX_CART_ITEMS`]
    ///
    /// An entry whose quantity is above [`MAX_ITEM_QUANTITY`] is kept at the
    /// limit. Titles are not checked here; the add-time rules only apply to
    /// new products.
    ///
    /// ```rust
    /// use basket_core::Cart;
    ///
    /// let blob = r#"[{"id":"p1","title":"Shoe","image_url":"u","price":100,"quantity":2},{}]"#;
    /// let decoded = Cart::from_json(blob).unwrap();
    /// assert_eq!(decoded.cart.len(), 1);
    /// assert_eq!(decoded.dropped, 1);
    /// ```
    pub fn from_json(blob: &str) -> CoreResult<DecodedCart> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(blob).map_err(|e| CoreError::Decode(e.to_string()))?;

        let mut cart = Cart::new();
        let mut dropped = 0;
        let mut clamped = 0;

        for value in raw {
            let Ok(mut item) = serde_json::from_value::<LineItem>(value) else {
                dropped += 1;
                continue;
            };

            let over_limit = item.quantity > MAX_ITEM_QUANTITY;
            if over_limit {
                item.quantity = MAX_ITEM_QUANTITY;
            }

            if validate_line_item(&item).is_err()
                || cart.contains(&item.id)
                || cart.items.len() >= MAX_CART_ITEMS
            {
                dropped += 1;
                continue;
            }

            if over_limit {
                clamped += 1;
            }
            cart.items.push(item);
        }

        Ok(DecodedCart {
            cart,
            dropped,
            clamped,
        })
    }
}

/// Cart totals summary for the cart badge and summary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    #[ts(type = "number")]
    pub item_count: usize,
    #[ts(type = "number")]
    pub total_quantity: i64,
    pub subtotal: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.len(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
        }
    }
}
