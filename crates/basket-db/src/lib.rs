//! # basket-db: SQLite Key-Value Storage for Basket
//!
//! A single-table key-value store on SQLite. The cart store writes its whole
//! cart as one JSON value under one key; the schema is one flat table.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basket Data Flow                                 │
//! │                                                                         │
//! │  basket-store persistence writer                                       │
//! │       │  storage.set("@Products:products", "[...]")                    │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     basket-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ KvRepository  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  get / set /  │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │  remove       │    │ 001_kv.sql   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file: <data_dir>/basket.db                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use basket_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./basket.db")).await?;
//! db.kv().set("@Products:products", "[]").await?;
//! let blob = db.kv().get("@Products:products").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::kv::KvRepository;
