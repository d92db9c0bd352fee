//! # Store Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Cart rules     │  │   Lifecycle     │  │     Storage             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Cart(CoreError)│  │  ScopeMisuse    │  │  Storage{key, reason}   │ │
//! │  │                 │  │  StoreClosed    │  │  Database               │ │
//! │  │                 │  │  ChannelError   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │  Configuration                          │                           │
//! │  │  InvalidConfig  ConfigLoadFailed        │                           │
//! │  │  ConfigSaveFailed                       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use basket_core::CoreError;
use basket_db::DbError;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the cart store, its storage backends, and its config.
#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Cart Errors
    // =========================================================================
    /// A cart rule rejected the operation. Nothing was mutated.
    #[error(transparent)]
    Cart(#[from] CoreError),

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// `use_cart()` was called outside a provider scope.
    #[error("use_cart() must be called within a CartProvider scope")]
    ScopeMisuse,

    /// The store has shut down; its actor no longer accepts commands.
    #[error("Cart store is closed")]
    StoreClosed,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// A key-value backend failed to read or write a key.
    #[error("Storage error for key '{key}': {reason}")]
    Storage { key: String, reason: String },

    /// Opening or migrating the SQLite backend failed.
    #[error("Database error: {0}")]
    Database(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

impl StoreError {
    /// Builds a [`StoreError::Storage`] for `key`.
    pub fn storage(key: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Storage {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the cart had no item with the requested id.
    pub fn is_item_not_found(&self) -> bool {
        matches!(self, StoreError::Cart(e) if e.is_not_found())
    }

    /// Returns true if retrying the same storage operation may succeed.
    ///
    /// Cart rule violations and configuration problems never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Storage { .. } | StoreError::Database(_) | StoreError::ChannelError(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidConfig(_)
                | StoreError::ConfigLoadFailed(_)
                | StoreError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_not_found_classification() {
        let err = StoreError::from(CoreError::not_found("p1"));
        assert!(err.is_item_not_found());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("p1"));

        assert!(!StoreError::ScopeMisuse.is_item_not_found());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::storage("k", "disk full").is_retryable());
        assert!(StoreError::Database("locked".into()).is_retryable());

        assert!(!StoreError::StoreClosed.is_retryable());
        assert!(!StoreError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(StoreError::InvalidConfig("x".into()).is_config_error());
        assert!(StoreError::ConfigLoadFailed("x".into()).is_config_error());
        assert!(!StoreError::StoreClosed.is_config_error());
    }

    #[test]
    fn test_storage_display_names_key() {
        let err = StoreError::storage("@Products:products", "boom");
        assert_eq!(
            err.to_string(),
            "Storage error for key '@Products:products': boom"
        );
    }
}
