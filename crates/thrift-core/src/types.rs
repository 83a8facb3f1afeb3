//! # Domain Types
//!
//! Core domain types for the stock reservation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Reservation   │   │    OrderLine    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  product_id     │       │
//! │  │  total_quantity │   │  product_id     │   │  quantity       │       │
//! │  │  is_available   │   │  holder_id      │   └─────────────────┘       │
//! │  │  price_cents    │   │  expires_at     │                             │
//! │  │  weight_grams   │   │  extension_count│                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Weight      │   │   Destination   │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  grams (i64)    │   │  postal_code    │                             │
//! │  │  200g = 0.2kg   │   │  state, country │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Holder Identity
//! A holder is identified by a plain opaque string: an authenticated user
//! id or an anonymous session token. The engine never interprets it; it is
//! only a key for the one-active-hold-per-(product, holder) rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Weight
// =============================================================================

/// A shipment weight in integer grams.
///
/// ## Why Grams?
/// Rate bands are configured in kilograms but carts sum dozens of item
/// weights. Integer grams keep that sum exact; converting to kg with
/// floats would accumulate rounding drift the same way float money does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Weight(i64);

impl Weight {
    /// Creates a weight from grams.
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    /// Creates a weight from whole kilograms (rate band boundaries).
    #[inline]
    pub const fn from_kg(kg: i64) -> Self {
        Weight(kg * 1000)
    }

    /// Returns the weight in grams.
    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    /// Zero weight.
    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    /// Grams above another weight, clamped at zero.
    ///
    /// Used for the per-kg charge: only the portion of the shipment above
    /// the band's `min_weight` is charged.
    #[inline]
    pub const fn excess_over(&self, other: Weight) -> Weight {
        let diff = self.0 - other.0;
        Weight(if diff > 0 { diff } else { 0 })
    }

    /// Adds another weight.
    #[inline]
    pub const fn plus(&self, other: Weight) -> Weight {
        Weight(self.0 + other.0)
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Weight {
        Weight(self.0 * qty)
    }

    /// Charge for this weight at a per-kilogram price.
    ///
    /// Billed per full kilogram: a partial kilogram under the next full
    /// unit rides free, so 0.2kg of excess over a band start costs
    /// nothing and 1.5kg costs one kilogram's worth.
    pub fn charge_per_kg(&self, per_kg: Money) -> Money {
        per_kg.multiply_quantity(self.0 / 1000)
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}kg", self.0 / 1000, (self.0 % 1000).abs())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A second-hand listing available for sale.
///
/// Owned by the catalog; the engine reads it and is the only writer of
/// `total_quantity` / `is_available` (commit decrement and restock).
/// `is_available` is re-derived from quantity on every stock mutation,
/// never toggled independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title shown to shoppers.
    pub title: String,

    /// Price in paise (smallest currency unit).
    pub price_cents: i64,

    /// Item weight in grams; None falls back to the 200 g default at
    /// shipping time.
    pub weight_grams: Option<i64>,

    /// Units in stock. Most thrift listings are 1.
    pub total_quantity: i64,

    /// Derived: `total_quantity > 0`.
    pub is_available: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the item weight, falling back to the default for listings
    /// created before weight was recorded.
    #[inline]
    pub fn weight(&self) -> Weight {
        Weight::from_grams(
            self.weight_grams
                .unwrap_or(crate::DEFAULT_ITEM_WEIGHT_GRAMS),
        )
    }

    /// A unique item gets exclusive-hold semantics: one shopper browsing
    /// the last unit locks everyone else out for the hold duration.
    #[inline]
    pub const fn is_unique(&self) -> bool {
        self.total_quantity == 1
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// A time-limited hold on N units of a product by one holder.
///
/// At most one active reservation exists per (product_id, holder_id) —
/// enforced by a UNIQUE constraint and upsert-on-conflict, not by
/// read-then-write. Only the `ReservationStore` writes these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: String,
    pub product_id: String,
    /// Opaque user id or session token.
    pub holder_id: String,
    /// Units held, >= 1.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Cleared on expiry sweep, release, or commit.
    pub is_active: bool,
    /// Extensions consumed so far.
    pub extension_count: i64,
    /// Extension budget; caps total hold lifetime at
    /// `ttl + max_extensions * extension_minutes`.
    pub max_extensions: i64,
}

impl Reservation {
    /// Whether the hold has lapsed at the given instant.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Live means active and not yet expired.
    #[inline]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Seconds until expiry, clamped at zero.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Whether another extension is permitted.
    #[inline]
    pub const fn can_extend(&self) -> bool {
        self.extension_count < self.max_extensions
    }
}

// =============================================================================
// Availability DTOs
// =============================================================================

/// Public availability snapshot for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Units free to reserve right now (stock minus live holds).
    pub available_units: i64,
    /// Total units in stock, held or not.
    pub total_units: i64,
}

/// Reservation status as seen by one shopper, mirroring what the product
/// page needs: is it held, by me, and for how much longer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatus {
    /// True when the shopper cannot freely take the product: either they
    /// hold it themselves or other holders have consumed all units.
    pub is_reserved: bool,
    /// True only when the asking holder owns the active hold.
    pub is_own_reservation: bool,
    /// Present for own holds.
    pub quantity: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub time_remaining: Option<i64>,
    /// For own holds this includes the holder's own quantity, matching
    /// what they could re-reserve.
    pub available_units: i64,
    pub total_units: i64,
}

// =============================================================================
// Checkout Types
// =============================================================================

/// One line of an order at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Outcome of a committed line: stock left after the decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedLine {
    pub product_id: String,
    pub quantity: i64,
    pub remaining_stock: i64,
}

// =============================================================================
// Shipping Input Types
// =============================================================================

/// One cart line as the shipping calculator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    /// Per-unit weight; None defaults to 200 g.
    pub weight_grams: Option<i64>,
    /// Per-unit price in paise.
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl ShipmentItem {
    /// Line weight with the default applied for unweighed items.
    pub fn line_weight(&self) -> Weight {
        Weight::from_grams(
            self.weight_grams
                .unwrap_or(crate::DEFAULT_ITEM_WEIGHT_GRAMS),
        )
        .multiply_quantity(self.quantity)
    }

    /// Line value.
    pub fn line_value(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A shipping destination: postal code / state / country triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub postal_code: String,
    /// Two-letter state code, e.g. "DL", "MH".
    pub state: String,
    /// ISO country code; empty means the default country.
    #[serde(default)]
    pub country: String,
}

impl Destination {
    pub fn new(
        postal_code: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Destination {
            postal_code: postal_code.into(),
            state: state.into(),
            country: country.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation(expires_in_secs: i64) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: "r1".to_string(),
            product_id: "p1".to_string(),
            holder_id: "h1".to_string(),
            quantity: 1,
            created_at: now,
            expires_at: now + Duration::seconds(expires_in_secs),
            is_active: true,
            extension_count: 0,
            max_extensions: 1,
        }
    }

    #[test]
    fn test_weight_excess() {
        let w = Weight::from_grams(2_500);
        assert_eq!(w.excess_over(Weight::from_kg(1)).grams(), 1_500);
        assert_eq!(w.excess_over(Weight::from_kg(3)).grams(), 0);
    }

    #[test]
    fn test_weight_charge_per_kg() {
        // Whole kilograms only: 1.5kg of excess bills one kg
        let excess = Weight::from_grams(1_500);
        assert_eq!(excess.charge_per_kg(Money::from_major(10)).cents(), 1_000);
        let excess = Weight::from_grams(2_500);
        assert_eq!(excess.charge_per_kg(Money::from_major(10)).cents(), 2_000);

        // A partial kilogram rides free
        assert_eq!(
            Weight::from_grams(200)
                .charge_per_kg(Money::from_major(10))
                .cents(),
            0
        );
        assert_eq!(Weight::zero().charge_per_kg(Money::from_major(10)).cents(), 0);
    }

    #[test]
    fn test_weight_display() {
        assert_eq!(Weight::from_grams(200).to_string(), "0.200kg");
        assert_eq!(Weight::from_grams(2_500).to_string(), "2.500kg");
    }

    #[test]
    fn test_reservation_expiry() {
        let now = Utc::now();
        let live = reservation(600);
        assert!(live.is_live(now));
        assert!(live.time_remaining(now) > 0);

        let lapsed = reservation(-5);
        assert!(lapsed.is_expired(now));
        assert!(!lapsed.is_live(now));
        assert_eq!(lapsed.time_remaining(now), 0);
    }

    #[test]
    fn test_reservation_extension_budget() {
        let mut r = reservation(600);
        assert!(r.can_extend());
        r.extension_count = 1;
        assert!(!r.can_extend());
    }

    #[test]
    fn test_shipment_item_defaults() {
        let item = ShipmentItem {
            weight_grams: None,
            unit_price_cents: 50_000,
            quantity: 2,
        };
        assert_eq!(item.line_weight().grams(), 400);
        assert_eq!(item.line_value().cents(), 100_000);
    }
}
