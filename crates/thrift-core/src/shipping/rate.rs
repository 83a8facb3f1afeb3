//! # Shipping Methods and Rate Bands
//!
//! The zone × method × weight-band cost matrix. Pure lookup, no mutable
//! state.
//!
//! ## Band Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Zone: Local (Delhi NCR), Method: Standard                              │
//! │                                                                         │
//! │  Band A:  0kg ──── 1kg   base ₹40, ₹10/kg                              │
//! │  Band B:  1kg ──── 3kg   base ₹50, ₹15/kg                              │
//! │  Band C:  3kg ──── ∞     base ₹80, ₹20/kg                              │
//! │                                                                         │
//! │  Shipment 2.5kg:                                                        │
//! │    A applies?  min 0 <= 2.5, but max 1 < 2.5   → no                    │
//! │    B applies?  min 1 <= 2.5 <= max 3           → yes                   │
//! │    C applies?  min 3 >  2.5                     → no                    │
//! │                                                                         │
//! │  Tightest fit = applicable band with the highest min weight.           │
//! │  Bands must be contiguous and non-overlapping per (zone, method),      │
//! │  so at most one band applies; ties fall back to the lowest rate id.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ShippingError;
use crate::money::Money;
use crate::types::Weight;

// =============================================================================
// Shipping Method
// =============================================================================

/// A delivery speed tier (Standard, Express, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Delivery estimate surfaced to the shopper.
    pub estimated_days: u32,

    /// Multiplier over the band cost, in basis points (10000 = 1.0x,
    /// 15000 = 1.5x). Faster methods multiply the same band matrix
    /// instead of duplicating it.
    pub cost_multiplier_bps: u32,

    /// Heaviest shipment the method accepts; None means unbounded.
    #[serde(default)]
    pub max_weight: Option<Weight>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ShippingMethod {
    /// Whether this method can carry a shipment of the given weight.
    pub fn carries(&self, weight: Weight) -> bool {
        self.is_active && self.max_weight.map_or(true, |max| weight <= max)
    }
}

// =============================================================================
// Shipping Rate
// =============================================================================

/// One weight band of the cost matrix for a (zone, method) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRate {
    pub id: i64,
    pub zone_id: i64,
    pub method_id: i64,

    /// Band start, inclusive.
    pub min_weight: Weight,

    /// Band end, inclusive at lookup time; None means unbounded.
    #[serde(default)]
    pub max_weight: Option<Weight>,

    /// Flat cost for entering this band.
    pub base_cost: Money,

    /// Charge per full kilogram above `min_weight`.
    pub per_kg_cost: Money,

    /// Declared-value insurance in basis points (200 = 2%).
    pub insurance_rate_bps: u32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ShippingRate {
    /// Whether this band covers the given weight.
    pub fn covers(&self, weight: Weight) -> bool {
        self.is_active
            && self.min_weight <= weight
            && self.max_weight.map_or(true, |max| weight <= max)
    }
}

// =============================================================================
// Rate Table
// =============================================================================

/// The full rate matrix with band lookup.
#[derive(Debug, Clone)]
pub struct RateTable<'a> {
    rates: &'a [ShippingRate],
}

impl<'a> RateTable<'a> {
    pub fn new(rates: &'a [ShippingRate]) -> Self {
        RateTable { rates }
    }

    /// Finds the tightest-fitting band for (zone, method, weight).
    ///
    /// Highest `min_weight` wins; the non-overlap invariant makes ties
    /// impossible in a valid table, but a duplicate band still resolves
    /// deterministically to the lowest rate id.
    pub fn applicable(
        &self,
        zone_id: i64,
        method_id: i64,
        weight: Weight,
    ) -> Option<&'a ShippingRate> {
        self.rates
            .iter()
            .filter(|r| r.zone_id == zone_id && r.method_id == method_id && r.covers(weight))
            .min_by_key(|r| (std::cmp::Reverse(r.min_weight), r.id))
    }

    /// Validates band contiguity and non-overlap per (zone, method).
    ///
    /// Rules, checked over active bands sorted by `min_weight`:
    /// - each band except the last must be bounded
    /// - the next band must start exactly where the previous one ends
    ///
    /// Called when loading configuration so a bad matrix fails loudly at
    /// startup rather than quoting the wrong band at checkout.
    pub fn validate_bands(
        &self,
        zone_name: impl Fn(i64) -> String,
        method_name: impl Fn(i64) -> String,
    ) -> Result<(), ShippingError> {
        let mut pairs: Vec<(i64, i64)> = self
            .rates
            .iter()
            .filter(|r| r.is_active)
            .map(|r| (r.zone_id, r.method_id))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        for (zone_id, method_id) in pairs {
            let mut bands: Vec<&ShippingRate> = self
                .rates
                .iter()
                .filter(|r| r.is_active && r.zone_id == zone_id && r.method_id == method_id)
                .collect();
            bands.sort_by_key(|r| (r.min_weight, r.id));

            for pair in bands.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                let invalid = match prev.max_weight {
                    // Unbounded band must be the last one
                    None => true,
                    Some(max) => next.min_weight != max,
                };
                if invalid {
                    return Err(ShippingError::InvalidRateTable {
                        zone: zone_name(zone_id),
                        method: method_name(method_id),
                        reason: format!(
                            "band starting at {} does not continue from {}",
                            next.min_weight, prev.min_weight
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
