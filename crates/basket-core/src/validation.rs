//! # Validation Module
//!
//! Input validation for add-to-cart descriptors and for entries read back
//! from storage during hydration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add_to_cart(product)            hydrate(blob)                          │
//! │        │                               │                                │
//! │        ▼                               ▼                                │
//! │  validate_product()              validate_line_item()                   │
//! │        │                               │                                │
//! │   Err → returned to caller        Err → entry dropped, counted         │
//! │   Ok  → Cart::add                 Ok  → kept                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{LineItem, Product};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_ID_LEN: usize = 128;
const MAX_TITLE_LEN: usize = 200;
const MAX_IMAGE_URL_LEN: usize = 2048;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item identifier.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 128 characters
///
/// ```rust
/// use basket_core::validation::validate_item_id;
///
/// assert!(validate_item_id("p1").is_ok());
/// assert!(validate_item_id("  ").is_err());
/// ```
pub fn validate_item_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a display title (required, at most 200 characters).
pub fn validate_title(title: &str) -> ValidationResult<()> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Validates an image reference. Empty is allowed (placeholder image).
pub fn validate_image_url(url: &str) -> ValidationResult<()> {
    if url.len() > MAX_IMAGE_URL_LEN {
        return Err(ValidationError::TooLong {
            field: "image_url".to_string(),
            max: MAX_IMAGE_URL_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit price in cents. Zero is allowed (free items).
///
/// ```rust
/// use basket_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the quantity of a present line item (1..=999).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates an add-to-cart descriptor.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_item_id(&product.id)?;
    validate_title(&product.title)?;
    validate_image_url(&product.image_url)?;
    validate_price_cents(product.price.cents())
}

/// Validates a line item read back from storage.
///
/// The title is not required here: a cart written by an older build may
/// hold an entry with an empty title, and dropping it would lose a
/// product the user chose.
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_item_id(&item.id)?;
    validate_price_cents(item.price.cents())?;
    validate_quantity(item.quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================
