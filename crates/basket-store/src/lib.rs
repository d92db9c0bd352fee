//! # basket-store: Persistent Cart Store
//!
//! A shopping-cart state container for a UI layer. One [`CartProvider`]
//! owns one store; code inside its scope reaches the cart through
//! [`use_cart`] and mutates it through a [`CartHandle`]. Every change is
//! published to subscribers and written to key-value storage so the cart
//! survives restarts.
//!
//! ## Module Organization
//! ```text
//! basket_store/
//! ├── lib.rs          ◄─── You are here
//! ├── provider.rs     ◄─── CartProvider, use_cart() scope
//! ├── store.rs        ◄─── CartActor (owns the Cart), CartHandle
//! ├── writer.rs       ◄─── Ordered persistence writer, retry, failures
//! ├── storage/
//! │   ├── mod.rs      ◄─── KeyValueStorage trait
//! │   ├── memory.rs   ◄─── In-process backend (+ fault injection)
//! │   └── sqlite.rs   ◄─── basket-db backend
//! ├── config.rs       ◄─── StoreConfig (TOML + env)
//! └── error.rs        ◄─── StoreError
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use basket_core::{Money, Product};
//! use basket_store::{use_cart, CartProvider, MemoryStorage, StoreConfig};
//!
//! let provider = CartProvider::new(Arc::new(MemoryStorage::new()), &StoreConfig::default());
//!
//! provider.scope(async {
//!     let cart = use_cart()?;
//!     cart.add_to_cart(Product::new("p1", "Shoe", "https://img/p1", Money::from_cents(4999))).await?;
//!     cart.increment("p1").await?;
//!     cart.flush().await
//! }).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod storage;
pub mod store;
pub mod writer;

pub use config::{PersistenceSettings, StorageBackend, StorageSettings, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use provider::{use_cart, CartProvider};
pub use storage::{KeyValueStorage, MemoryStorage, SharedStorage, SqliteStorage};
pub use store::{CartHandle, HydrationStatus};
pub use writer::{FailedOperation, PersistFailure};
