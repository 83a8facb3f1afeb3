//! # thrift-core: Pure Business Logic for the ThriftTees Engine
//!
//! This crate is the **heart** of the reservation and shipping engine. It
//! contains all business rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ThriftTees Engine Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Storefront / API (out of scope)               │   │
//! │  │    Listing page ──► Reserve button ──► Cart ──► Checkout        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ thrift-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  shipping │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │   zones   │  │   rules   │  │   │
//! │  │   │Reservation│  │  Weight*  │  │   rates   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                          (* in types)                          │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  thrift-db (Database Layer)                     │   │
//! │  │     SQLite reservations, availability, commit coordinator       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Reservation, Weight, Destination)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`shipping`] - Zone resolution and tiered rate calculation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O, No Clock**: Time is always passed in as `DateTime<Utc>`
//! 3. **Integer Money**: All monetary values are paise (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use thrift_core::money::Money;
//! use thrift_core::shipping::{ShippingCalculator, ShippingConfig};
//! use thrift_core::types::{Destination, ShipmentItem};
//!
//! let calc = ShippingCalculator::new(ShippingConfig::india_default()).unwrap();
//!
//! // One ₹500 t-shirt, no listed weight (defaults to 200g), to Delhi
//! let items = [ShipmentItem { weight_grams: None, unit_price_cents: 50_000, quantity: 1 }];
//! let quote = calc
//!     .calculate(&items, &Destination::new("110001", "DL", "IN"), None)
//!     .unwrap();
//!
//! // Standard to NCR: ₹40 base + 2% insurance on ₹500; a partial
//! // kilogram over the band start carries no weight charge
//! assert_eq!(quote.cost, Money::from_major(50));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod shipping;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use thrift_core::Money` instead of
// `use thrift_core::money::Money`

pub use error::{CoreError, CoreResult, ShippingError, ShippingResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// How long a fresh hold lasts, in minutes.
///
/// ## Business Reason
/// Long enough to fill in checkout details, short enough that an
/// abandoned tab frees a unique item the same browsing session.
pub const DEFAULT_HOLD_TTL_MINUTES: i64 = 15;

/// Minutes added per extension.
pub const DEFAULT_EXTENSION_MINUTES: i64 = 5;

/// Extensions allowed per reservation before it must lapse.
///
/// ## Business Reason
/// One extension covers a slow payment page; unlimited extensions would
/// let a shopper camp on a unique item forever.
pub const DEFAULT_MAX_EXTENSIONS: i64 = 1;

/// Maximum quantity of a single product in one reservation.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// from locking up an entire multi-unit listing.
pub const MAX_RESERVATION_QUANTITY: i64 = 100;

/// Weight assumed for items with no listed weight, in grams.
///
/// Most of the catalog is t-shirts; 200g is a sensible stand-in when the
/// seller didn't weigh the item.
pub const DEFAULT_ITEM_WEIGHT_GRAMS: i64 = 200;

/// Minimum billable shipment weight, in grams.
///
/// Couriers don't quote below 100g; neither do we.
pub const MIN_SHIPMENT_WEIGHT_GRAMS: i64 = 100;
