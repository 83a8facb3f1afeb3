//! # Validation Module
//!
//! Input validation for reservation and shipping requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API collaborator (HTTP framework, out of scope)              │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (total_quantity >= 0, quantity >= 1)                        │
//! │  ├── UNIQUE (product_id, holder_id)                                    │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_RESERVATION_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a reservation/order quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
/// - Must not exceed MAX_RESERVATION_QUANTITY (100)
///
/// The upper bound guards against typo orders (1000 instead of 10)
/// hogging the whole stock of a multi-unit listing.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_RESERVATION_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_RESERVATION_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in paise.
///
/// Zero is allowed (promotional freebies); negative is not.
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

// =============================================================================
// String Validators
// =============================================================================

/// Validates a holder identity (user id or session token).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
///
/// The holder id is opaque; the only requirement is that it is a stable,
/// bounded key for the one-hold-per-holder constraint.
pub fn validate_holder_id(holder_id: &str) -> ValidationResult<()> {
    let holder_id = holder_id.trim();

    if holder_id.is_empty() {
        return Err(ValidationError::Required {
            field: "holder_id".to_string(),
        });
    }

    if holder_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "holder_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates an Indian PIN code: exactly six digits.
///
/// ## Example
/// ```rust
/// use thrift_core::validation::validate_postal_code;
///
/// assert!(validate_postal_code("110001").is_ok());
/// assert!(validate_postal_code("1100").is_err());
/// assert!(validate_postal_code("11000a").is_err());
/// ```
pub fn validate_postal_code(postal_code: &str) -> ValidationResult<()> {
    let postal_code = postal_code.trim();

    if postal_code.len() != 6 || !postal_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "postal_code".to_string(),
            reason: "must be a 6-digit PIN code".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(101).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(49_900).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_holder_id() {
        assert!(validate_holder_id("user-42").is_ok());
        assert!(validate_holder_id("session:9f8e7d6c").is_ok());

        assert!(validate_holder_id("").is_err());
        assert!(validate_holder_id("   ").is_err());
        assert!(validate_holder_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("110001").is_ok());
        assert!(validate_postal_code(" 400001 ").is_ok());

        assert!(validate_postal_code("").is_err());
        assert!(validate_postal_code("1100").is_err());
        assert!(validate_postal_code("11000a").is_err());
        assert!(validate_postal_code("1100011").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
