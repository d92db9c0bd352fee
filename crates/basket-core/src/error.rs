//! # Error Types
//!
//! Domain-specific error types for basket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  basket-core errors (this file)                                        │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  basket-db errors (separate crate)                                     │
//! │  └── DbError          - SQLite key-value failures                      │
//! │                                                                         │
//! │  basket-store errors                                                   │
//! │  └── StoreError       - What UI callers see                            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → UI message           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the item identifier in every message
//! 3. A failed operation leaves the cart exactly as it was

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart rule violations.
///
/// Every variant is returned *before* the cart is touched, so callers can
/// surface the message and carry on with the unchanged cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No line item with this identifier is in the cart.
    ///
    /// ## When This Occurs
    /// - `increment`/`decrement`/`remove` on an id that was never added
    /// - Double-tap on "−" after the item already dropped to zero and was removed
    #[error("Item not found in cart: {0}")]
    ItemNotFound(String),

    /// Cart has reached its distinct-item limit.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity would exceed the per-item limit.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The persisted cart blob is not a JSON array.
    #[error("Persisted cart could not be decoded: {0}")]
    Decode(String),

    /// The cart could not be encoded for storage.
    #[error("Cart could not be encoded: {0}")]
    Encode(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an ItemNotFound error for the given identifier.
    pub fn not_found(id: impl Into<String>) -> Self {
        CoreError::ItemNotFound(id.into())
    }

    /// Returns true for the "item not found" kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ItemNotFound(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for add-to-cart descriptors and hydrated entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("p1");
        assert_eq!(err.to_string(), "Item not found in cart: p1");
        assert!(err.is_not_found());

        let err = CoreError::QuantityTooLarge {
            requested: 1000,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1000 exceeds maximum allowed (999)");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "id".to_string(),
        };
        assert_eq!(err.to_string(), "id is required");

        let err = ValidationError::TooLong {
            field: "title".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "title must be at most 200 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
