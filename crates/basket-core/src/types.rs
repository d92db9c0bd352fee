//! # Domain Types
//!
//! The two shapes a cart entry takes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   add_to_cart()    ┌─────────────────┐            │
//! │  │    Product      │ ─────────────────► │    LineItem     │            │
//! │  │  ─────────────  │   quantity = 1     │  ─────────────  │            │
//! │  │  id             │                    │  id             │            │
//! │  │  title          │                    │  title          │            │
//! │  │  image_url      │                    │  image_url      │            │
//! │  │  price (Money)  │                    │  price (Money)  │            │
//! │  └─────────────────┘                    │  quantity ≥ 1   │            │
//! │                                         └─────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Shape
//! A `LineItem` serializes to the object stored inside the cart blob, with
//! the price in major units:
//! `{"id":"p1","title":"Shoe","image_url":"u","price":49.99,"quantity":1}`

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// The descriptor a screen passes to `add_to_cart`.
///
/// Carries no quantity: a fresh add always starts at 1, and adding an id
/// that is already present only bumps the existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique product key.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Image reference (usually a URL).
    pub image_url: String,

    /// Unit price.
    pub price: Money,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Money,
    ) -> Self {
        Product {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product in the cart with its quantity.
///
/// ## Invariants (enforced by [`crate::Cart`])
/// - `id` is unique within a cart
/// - `quantity` is between 1 and [`crate::MAX_ITEM_QUANTITY`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,

    pub title: String,

    pub image_url: String,

    /// Unit price, frozen when the item was first added.
    pub price: Money,

    #[ts(type = "number")]
    pub quantity: i64,
}

impl LineItem {
    /// Creates a line item with quantity 1 from a product descriptor.
    pub fn from_product(product: &Product) -> Self {
        LineItem {
            id: product.id.clone(),
            title: product.title.clone(),
            image_url: product.image_url.clone(),
            price: product.price,
            quantity: 1,
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_product_starts_at_one() {
        let product = Product::new("p1", "Shoe", "u", Money::from_cents(100));
        let item = LineItem::from_product(&product);

        assert_eq!(item.id, "p1");
        assert_eq!(item.title, "Shoe");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.line_total(), Money::from_cents(100));
    }

    #[test]
    fn test_line_item_json_shape() {
        let item = LineItem {
            id: "p1".into(),
            title: "Shoe".into(),
            image_url: "u".into(),
            price: Money::from_cents(4999),
            quantity: 2,
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "p1",
                "title": "Shoe",
                "image_url": "u",
                "price": 49.99,
                "quantity": 2
            })
        );
    }
}
