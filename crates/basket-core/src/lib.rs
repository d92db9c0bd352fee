//! # basket-core: Pure Cart Logic for Basket
//!
//! This crate holds the cart rules as plain data and pure functions. The
//! store crate wraps them in an actor and persists the result; nothing in
//! here touches storage, channels, or the clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Basket Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     UI layer (screens)                          │   │
//! │  │    Product list ──► Cart badge ──► Cart screen (+ / − buttons)  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ use_cart()                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        basket-store (CartProvider, CartHandle, writer)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ basket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │ LineItem  │  │           │  │  codec    │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO ASYNC • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Product` (add-to-cart descriptor) and `LineItem`
//! - [`money`] - Integer money (minor units)
//! - [`cart`] - `Cart` mutations, totals, persisted-format codec
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use basket_core::{Cart, Money, Product};
//!
//! let mut cart = Cart::new();
//! let shoe = Product::new("p1", "Shoe", "https://img/p1.png", Money::from_cents(100));
//!
//! cart.add(&shoe).unwrap();
//! cart.increment("p1").unwrap();
//! assert_eq!(cart.get("p1").map(|i| i.quantity), Some(2));
//!
//! // Decrementing to zero removes the entry
//! cart.decrement("p1").unwrap();
//! cart.decrement("p1").unwrap();
//! assert!(cart.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartTotals, DecodedCart};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::{LineItem, Product};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Storage key the cart blob lives under unless configured otherwise.
///
/// Existing persisted carts are stored under this exact key.
pub const DEFAULT_STORAGE_KEY: &str = "@Products:products";

/// Maximum distinct items allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Rapid repeated taps on "+" stop here instead of growing without bound.
pub const MAX_ITEM_QUANTITY: i64 = 999;
