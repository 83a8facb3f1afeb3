//! # Error Types
//!
//! Domain-specific error types for thrift-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  thrift-core errors (this file)                                        │
//! │  ├── CoreError        - Reservation/commit rule violations             │
//! │  ├── ShippingError    - Zone/rate resolution failures                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  thrift-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - CoreError + DbError at the service surface     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → API collaborator    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (available units, ids)
//! 3. Errors are enum variants, never String
//! 4. Recoverability is a property of the variant, not of the message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reservation and checkout rule violations.
///
/// All of these are user-recoverable: the shopper can retry with a
/// smaller quantity, wait for a hold to lapse, or re-reserve.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id doesn't exist or the listing is gone.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Not enough units free to reserve. `available` is what the caller
    /// must surface to the shopper ("Only N items available").
    #[error("Only {available} unit(s) available for reservation, requested {requested}")]
    InsufficientAvailability { available: i64, requested: i64 },

    /// A unique item is held by someone else; no quantity would succeed
    /// until their hold lapses.
    #[error("Product {product_id} is currently reserved by another shopper")]
    AlreadyReserved { product_id: String },

    /// Reservation id doesn't exist or belongs to a different holder.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// The hold lapsed before the operation; the shopper must re-reserve.
    #[error("Reservation {0} has expired")]
    ReservationExpired(String),

    /// Extension budget exhausted. Prevents one shopper camping on a
    /// unique item indefinitely.
    #[error("Reservation cannot be extended again ({used}/{max} extensions used)")]
    ExtensionLimitReached { used: i64, max: i64 },

    /// Stock ran out between reservation and commit. The whole order
    /// attempt is aborted; nothing was decremented.
    #[error("Out of stock for {product_id}: available {available}, requested {requested}")]
    OutOfStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Shipping Error
// =============================================================================

/// Shipping calculation failures.
///
/// Surfaced to the shopper as "shipping unavailable for this address";
/// never retried automatically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShippingError {
    /// No configured zone matches the destination's postal code or state.
    #[error("No shipping available for {postal_code}, {state}")]
    UnsupportedDestination { postal_code: String, state: String },

    /// A zone matched but no rate band covers the shipment weight for
    /// any usable method.
    #[error("No shipping rate for zone '{zone}' at {weight_grams}g")]
    NoApplicableRate { zone: String, weight_grams: i64 },

    /// Caller asked for a method id that isn't configured.
    #[error("Shipping method not found: {0}")]
    MethodNotFound(i64),

    /// Caller asked for a method that is inactive or over its weight cap
    /// for this shipment.
    #[error("Shipping method '{name}' is not usable for this shipment")]
    MethodUnavailable { name: String },

    /// Configured rate bands overlap or leave gaps for a (zone, method).
    #[error("Invalid rate table for zone '{zone}', method '{method}': {reason}")]
    InvalidRateTable {
        zone: String,
        method: String,
        reason: String,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements; used for
/// early validation before any business logic runs.
#[derive(Debug, Error, PartialEq, Eq)]
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid PIN code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for shipping calculations.
pub type ShippingResult<T> = Result<T, ShippingError>;

// =============================================================================
// Unit Tests
// =============================================================================
