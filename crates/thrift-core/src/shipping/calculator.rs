//! # Shipping Calculator
//!
//! Composes the zone resolver and rate table into the quote the checkout
//! page shows before commit.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate(items, destination, method?)                                 │
//! │                                                                         │
//! │  1. ZoneResolver.resolve(destination)      → zone | Unsupported        │
//! │  2. Σ weight (default 200g/item, floor 100g), Σ value                  │
//! │  3. method given?  validate active + weight cap                        │
//! │     else           cheapest by (multiplier, band base cost)            │
//! │  4. RateTable.applicable(zone, method, weight) → band                  │
//! │  5. cost = (base + full_excess_kg × per_kg) × mult + value × insurance │
//! │  6. value ≥ zone threshold?  → cost 0, breakdown all-zero              │
//! │                                                                         │
//! │  Step 6 zeroes every component, not just the total: a "FREE            │
//! │  shipping" banner must never show a residual insurance charge.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ShippingError, ShippingResult};
use crate::money::Money;
use crate::types::{Destination, ShipmentItem, Weight};
use crate::MIN_SHIPMENT_WEIGHT_GRAMS;

use super::config::ShippingConfig;
use super::rate::{RateTable, ShippingMethod, ShippingRate};
use super::zone::ZoneResolver;

// =============================================================================
// Quote Types
// =============================================================================

/// Per-component cost breakdown shown alongside the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Flat band cost after the method multiplier.
    pub base_cost: Money,
    /// Per-kg charge for each full kilogram above the band start, after
    /// the multiplier. Partial kilograms ride free.
    pub weight_cost: Money,
    /// Declared-value insurance.
    pub insurance_cost: Money,
    /// Method multiplier that was applied, in basis points.
    pub method_multiplier_bps: u32,
    pub free_shipping_applied: bool,
}

impl CostBreakdown {
    /// The all-zero breakdown reported under free shipping.
    fn free(multiplier_bps: u32) -> Self {
        CostBreakdown {
            base_cost: Money::zero(),
            weight_cost: Money::zero(),
            insurance_cost: Money::zero(),
            method_multiplier_bps: multiplier_bps,
            free_shipping_applied: true,
        }
    }
}

/// A priced shipping option for one cart + destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub cost: Money,
    pub method_id: i64,
    pub method: String,
    pub estimated_days: u32,
    pub zone: String,
    pub total_weight: Weight,
    pub total_value: Money,
    pub breakdown: CostBreakdown,
}

// =============================================================================
// Shipping Calculator
// =============================================================================

/// Stateless calculator over a validated [`ShippingConfig`].
#[derive(Debug, Clone)]
pub struct ShippingCalculator {
    config: ShippingConfig,
}

impl ShippingCalculator {
    /// Wraps a config, validating its rate bands first.
    pub fn new(config: ShippingConfig) -> ShippingResult<Self> {
        config.validate()?;
        Ok(ShippingCalculator { config })
    }

    pub fn config(&self) -> &ShippingConfig {
        &self.config
    }

    /// Produces a quote for a cart shipped to a destination.
    ///
    /// `method_id` pins a specific method (shopper picked Express);
    /// `None` selects the cheapest usable one.
    pub fn calculate(
        &self,
        items: &[ShipmentItem],
        destination: &Destination,
        method_id: Option<i64>,
    ) -> ShippingResult<ShippingQuote> {
        let resolver = ZoneResolver::new(&self.config.zones);
        let table = RateTable::new(&self.config.rates);

        let zone = resolver.resolve(destination)?;

        let total_weight = Self::total_weight(items);
        let total_value: Money = items.iter().map(ShipmentItem::line_value).sum();

        let (method, rate) = match method_id {
            Some(id) => self.requested_method(&table, zone.id, id, total_weight)?,
            None => self.cheapest_method(&table, zone.id, total_weight).ok_or(
                ShippingError::NoApplicableRate {
                    zone: zone.name.clone(),
                    weight_grams: total_weight.grams(),
                },
            )?,
        };

        // Free shipping zeroes the entire quote, never just the subtotal.
        if let Some(threshold) = zone.free_shipping_threshold {
            if total_value >= threshold {
                return Ok(ShippingQuote {
                    cost: Money::zero(),
                    method_id: method.id,
                    method: method.name.clone(),
                    estimated_days: method.estimated_days,
                    zone: zone.name.clone(),
                    total_weight,
                    total_value,
                    breakdown: CostBreakdown::free(method.cost_multiplier_bps),
                });
            }
        }

        let base_cost = rate.base_cost.apply_bps(method.cost_multiplier_bps);
        let weight_cost = total_weight
            .excess_over(rate.min_weight)
            .charge_per_kg(rate.per_kg_cost)
            .apply_bps(method.cost_multiplier_bps);
        let insurance_cost = total_value.apply_bps(rate.insurance_rate_bps);

        Ok(ShippingQuote {
            cost: base_cost + weight_cost + insurance_cost,
            method_id: method.id,
            method: method.name.clone(),
            estimated_days: method.estimated_days,
            zone: zone.name.clone(),
            total_weight,
            total_value,
            breakdown: CostBreakdown {
                base_cost,
                weight_cost,
                insurance_cost,
                method_multiplier_bps: method.cost_multiplier_bps,
                free_shipping_applied: false,
            },
        })
    }

    /// Shipment weight: per-item default for unweighed listings, then a
    /// 100 g floor so couriers never see a zero-weight parcel.
    fn total_weight(items: &[ShipmentItem]) -> Weight {
        let sum = items
            .iter()
            .fold(Weight::zero(), |acc, item| acc.plus(item.line_weight()));
        Weight::from_grams(sum.grams().max(MIN_SHIPMENT_WEIGHT_GRAMS))
    }

    /// Validates an explicitly requested method against activity, weight
    /// cap, and rate coverage.
    fn requested_method<'a>(
        &'a self,
        table: &RateTable<'a>,
        zone_id: i64,
        method_id: i64,
        weight: Weight,
    ) -> ShippingResult<(&'a ShippingMethod, &'a ShippingRate)> {
        let method = self
            .config
            .methods
            .iter()
            .find(|m| m.id == method_id)
            .ok_or(ShippingError::MethodNotFound(method_id))?;

        if !method.carries(weight) {
            return Err(ShippingError::MethodUnavailable {
                name: method.name.clone(),
            });
        }

        let rate = table.applicable(zone_id, method.id, weight).ok_or_else(|| {
            ShippingError::NoApplicableRate {
                zone: self.config.zone_name(zone_id),
                weight_grams: weight.grams(),
            }
        })?;

        Ok((method, rate))
    }

    /// Cheapest usable method: minimal `(cost_multiplier, band base
    /// cost)` among active methods that carry the weight and have a
    /// covering band; method id breaks exact ties deterministically.
    fn cheapest_method<'a>(
        &'a self,
        table: &RateTable<'a>,
        zone_id: i64,
        weight: Weight,
    ) -> Option<(&'a ShippingMethod, &'a ShippingRate)> {
        self.config
            .methods
            .iter()
            .filter(|m| m.carries(weight))
            .filter_map(|m| {
                table
                    .applicable(zone_id, m.id, weight)
                    .map(|rate| (m, rate))
            })
            .min_by_key(|(m, rate)| (m.cost_multiplier_bps, rate.base_cost, m.id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::config::ShippingConfig;
    use crate::shipping::zone::ShippingZone;

    fn item(weight_grams: Option<i64>, price_major: i64, qty: i64) -> ShipmentItem {
        ShipmentItem {
            weight_grams,
            unit_price_cents: Money::from_major(price_major).cents(),
            quantity: qty,
        }
    }

    fn ncr() -> Destination {
        Destination::new("110001", "DL", "IN")
    }

    fn calculator() -> ShippingCalculator {
        ShippingCalculator::new(ShippingConfig::india_default()).unwrap()
    }

    /// Single-zone config with one Standard (1.0x) and one Express
    /// (1.5x) method, used where the seeded dataset is too big to
    /// reason about in a test.
    fn small_config() -> ShippingConfig {
        ShippingConfig {
            zones: vec![ShippingZone {
                id: 1,
                name: "Test Zone".to_string(),
                description: String::new(),
                states: vec!["DL".to_string()],
                metro_postal_codes: vec![],
                countries: vec![],
                base_cost: Money::from_major(40),
                free_shipping_threshold: Some(Money::from_major(1000)),
                is_active: true,
            }],
            methods: vec![
                ShippingMethod {
                    id: 1,
                    name: "Standard".to_string(),
                    description: String::new(),
                    estimated_days: 5,
                    cost_multiplier_bps: 10_000,
                    max_weight: Some(Weight::from_kg(5)),
                    is_active: true,
                },
                ShippingMethod {
                    id: 2,
                    name: "Express".to_string(),
                    description: String::new(),
                    estimated_days: 2,
                    cost_multiplier_bps: 15_000,
                    max_weight: Some(Weight::from_kg(3)),
                    is_active: true,
                },
            ],
            rates: vec![
                ShippingRate {
                    id: 1,
                    zone_id: 1,
                    method_id: 1,
                    min_weight: Weight::zero(),
                    max_weight: Some(Weight::from_kg(1)),
                    base_cost: Money::from_major(50),
                    per_kg_cost: Money::from_major(10),
                    insurance_rate_bps: 200,
                    is_active: true,
                },
                ShippingRate {
                    id: 2,
                    zone_id: 1,
                    method_id: 1,
                    min_weight: Weight::from_kg(1),
                    max_weight: None,
                    base_cost: Money::from_major(80),
                    per_kg_cost: Money::from_major(20),
                    insurance_rate_bps: 200,
                    is_active: true,
                },
                ShippingRate {
                    id: 3,
                    zone_id: 1,
                    method_id: 2,
                    min_weight: Weight::zero(),
                    max_weight: None,
                    base_cost: Money::from_major(60),
                    per_kg_cost: Money::from_major(20),
                    insurance_rate_bps: 200,
                    is_active: true,
                },
            ],
        }
    }

    #[test]
    fn test_default_weight_single_item_no_weight_charge() {
        // 0.2kg default lands in the first band (starts at 0); under a
        // full kg of excess there is no weight charge.
        // base 50 + ₹100 × 2% = ₹2 insurance
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(None, 100, 1)], &ncr(), Some(1))
            .unwrap();

        assert_eq!(quote.total_weight.grams(), 200);
        assert_eq!(quote.breakdown.base_cost, Money::from_major(50));
        assert_eq!(quote.breakdown.weight_cost, Money::zero());
        assert_eq!(quote.breakdown.insurance_cost, Money::from_major(2));
        assert_eq!(quote.cost, Money::from_major(52));
    }

    #[test]
    fn test_band_start_has_zero_weight_charge() {
        // A shipment exactly at a band's min weight pays base only.
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(1_000), 100, 1)], &ncr(), Some(1))
            .unwrap();

        // 1kg lands in the second band (min 1kg): base 80, excess 0
        assert_eq!(quote.breakdown.base_cost, Money::from_major(80));
        assert_eq!(quote.breakdown.weight_cost, Money::zero());
    }

    #[test]
    fn test_multiplier_applies_to_base_and_weight_not_insurance() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(2_500), 100, 1)], &ncr(), Some(2))
            .unwrap();

        // Express: base 60 × 1.5 = 90, weight 2 full kg × ₹20 = 40 × 1.5 = 60,
        // insurance ₹100 × 2% = 2
        assert_eq!(quote.breakdown.base_cost, Money::from_major(90));
        assert_eq!(quote.breakdown.weight_cost, Money::from_major(60));
        assert_eq!(quote.breakdown.insurance_cost, Money::from_major(2));
        assert_eq!(quote.cost, Money::from_major(152));
    }

    #[test]
    fn test_free_shipping_breakdown_all_zero_at_exact_threshold() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(500), 1000, 1)], &ncr(), None)
            .unwrap();

        assert!(quote.breakdown.free_shipping_applied);
        assert_eq!(quote.cost, Money::zero());
        assert_eq!(quote.breakdown.base_cost, Money::zero());
        assert_eq!(quote.breakdown.weight_cost, Money::zero());
        assert_eq!(quote.breakdown.insurance_cost, Money::zero());
        // Method/ETA still reported so the UI can show "FREE via Standard"
        assert_eq!(quote.method, "Standard");
    }

    #[test]
    fn test_below_threshold_charges_normally() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(500), 999, 1)], &ncr(), None)
            .unwrap();

        assert!(!quote.breakdown.free_shipping_applied);
        assert!(quote.cost.is_positive());
    }

    #[test]
    fn test_cheapest_method_prefers_lower_multiplier() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(500), 100, 1)], &ncr(), None)
            .unwrap();

        assert_eq!(quote.method, "Standard");
        assert_eq!(quote.estimated_days, 5);
    }

    #[test]
    fn test_heavy_shipment_falls_to_capable_method() {
        // 4kg exceeds Express's 3kg cap; Standard (5kg cap) must win.
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(2_000), 100, 2)], &ncr(), None)
            .unwrap();

        assert_eq!(quote.method, "Standard");
    }

    #[test]
    fn test_requested_method_over_weight_cap_rejected() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let err = calc
            .calculate(&[item(Some(2_000), 100, 2)], &ncr(), Some(2))
            .unwrap_err();

        assert!(matches!(err, ShippingError::MethodUnavailable { .. }));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let err = calc
            .calculate(&[item(None, 100, 1)], &ncr(), Some(99))
            .unwrap_err();

        assert_eq!(err, ShippingError::MethodNotFound(99));
    }

    #[test]
    fn test_unsupported_destination() {
        let calc = calculator();
        let err = calc
            .calculate(
                &[item(None, 100, 1)],
                &Destination::new("999999", "XX", "IN"),
                None,
            )
            .unwrap_err();

        assert!(matches!(err, ShippingError::UnsupportedDestination { .. }));
    }

    #[test]
    fn test_minimum_shipment_weight_floor() {
        let calc = ShippingCalculator::new(small_config()).unwrap();
        let quote = calc
            .calculate(&[item(Some(10), 100, 1)], &ncr(), Some(1))
            .unwrap();

        assert_eq!(quote.total_weight.grams(), 100);
    }

    #[test]
    fn test_weight_sums_across_lines_without_drift() {
        // 30 lines of 0.2kg = exactly 6kg in integer grams
        let calc = calculator();
        let items: Vec<ShipmentItem> = (0..30).map(|_| item(Some(200), 10, 1)).collect();
        let quote = calc.calculate(&items, &ncr(), None).unwrap();

        assert_eq!(quote.total_weight.grams(), 6_000);
    }

    #[test]
    fn test_india_default_quotes_ncr() {
        // Seeded dataset smoke check: NCR, 0.2kg, ₹500 cart
        let calc = calculator();
        let quote = calc.calculate(&[item(None, 500, 1)], &ncr(), None).unwrap();

        assert_eq!(quote.zone, "Local (Delhi NCR)");
        assert_eq!(quote.method, "Standard Delivery");
        // base 40, no weight charge under a full kg, insurance ₹500 × 2% = ₹10
        assert_eq!(quote.cost, Money::from_major(50));
    }

    #[test]
    fn test_india_default_free_shipping_ncr() {
        // NCR free-shipping threshold is ₹800
        let calc = calculator();
        let quote = calc.calculate(&[item(None, 800, 1)], &ncr(), None).unwrap();

        assert!(quote.breakdown.free_shipping_applied);
        assert_eq!(quote.cost, Money::zero());
    }
}
