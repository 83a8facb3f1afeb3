//! # Shipping Configuration
//!
//! The zones + methods + rates bundle the calculator runs against,
//! loadable from JSON or seeded with the built-in India dataset.
//!
//! Configuration is validated as a whole at load time: rate bands must
//! be contiguous per (zone, method) and every rate must reference a
//! configured zone and method. A deploy with a broken matrix fails at
//! startup instead of mispricing checkouts.

use serde::{Deserialize, Serialize};

use crate::error::{ShippingError, ShippingResult};
use crate::money::Money;
use crate::types::Weight;

use super::rate::{RateTable, ShippingMethod, ShippingRate};
use super::zone::ShippingZone;

// =============================================================================
// Shipping Config
// =============================================================================

/// Full shipping configuration: zones, methods, and the rate matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingConfig {
    pub zones: Vec<ShippingZone>,
    pub methods: Vec<ShippingMethod>,
    pub rates: Vec<ShippingRate>,
}

impl ShippingConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> ShippingResult<Self> {
        let config: ShippingConfig =
            serde_json::from_str(json).map_err(|e| ShippingError::InvalidRateTable {
                zone: "<config>".to_string(),
                method: "<config>".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Zone name for error messages; falls back to the raw id.
    pub fn zone_name(&self, zone_id: i64) -> String {
        self.zones
            .iter()
            .find(|z| z.id == zone_id)
            .map(|z| z.name.clone())
            .unwrap_or_else(|| format!("zone #{zone_id}"))
    }

    /// Method name for error messages; falls back to the raw id.
    pub fn method_name(&self, method_id: i64) -> String {
        self.methods
            .iter()
            .find(|m| m.id == method_id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("method #{method_id}"))
    }

    /// Validates referential integrity and band contiguity.
    pub fn validate(&self) -> ShippingResult<()> {
        for rate in self.rates.iter().filter(|r| r.is_active) {
            if !self.zones.iter().any(|z| z.id == rate.zone_id) {
                return Err(ShippingError::InvalidRateTable {
                    zone: self.zone_name(rate.zone_id),
                    method: self.method_name(rate.method_id),
                    reason: format!("rate {} references an unknown zone", rate.id),
                });
            }
            if !self.methods.iter().any(|m| m.id == rate.method_id) {
                return Err(ShippingError::InvalidRateTable {
                    zone: self.zone_name(rate.zone_id),
                    method: self.method_name(rate.method_id),
                    reason: format!("rate {} references an unknown method", rate.id),
                });
            }
        }

        RateTable::new(&self.rates)
            .validate_bands(|id| self.zone_name(id), |id| self.method_name(id))
    }

    /// Built-in India configuration: seven zones from Delhi NCR out to
    /// the island territories, three delivery tiers, 2% insurance
    /// throughout. Every zone at least carries Standard Delivery; NCR
    /// also gets Express.
    pub fn india_default() -> Self {
        let zone = |id: i64,
                    name: &str,
                    description: &str,
                    states: &[&str],
                    metros: &[&str],
                    base: i64,
                    threshold: i64| ShippingZone {
            id,
            name: name.to_string(),
            description: description.to_string(),
            states: states.iter().map(|s| s.to_string()).collect(),
            metro_postal_codes: metros.iter().map(|p| p.to_string()).collect(),
            countries: vec![],
            base_cost: Money::from_major(base),
            free_shipping_threshold: Some(Money::from_major(threshold)),
            is_active: true,
        };

        let rate = |id: i64,
                    zone_id: i64,
                    method_id: i64,
                    min_kg: i64,
                    max_kg: Option<i64>,
                    base: i64,
                    per_kg: i64| ShippingRate {
            id,
            zone_id,
            method_id,
            min_weight: Weight::from_kg(min_kg),
            max_weight: max_kg.map(Weight::from_kg),
            base_cost: Money::from_major(base),
            per_kg_cost: Money::from_major(per_kg),
            insurance_rate_bps: 200,
            is_active: true,
        };

        let method = |id: i64,
                      name: &str,
                      description: &str,
                      days: u32,
                      multiplier_bps: u32,
                      max_kg: i64| ShippingMethod {
            id,
            name: name.to_string(),
            description: description.to_string(),
            estimated_days: days,
            cost_multiplier_bps: multiplier_bps,
            max_weight: Some(Weight::from_kg(max_kg)),
            is_active: true,
        };

        ShippingConfig {
            zones: vec![
                zone(
                    1,
                    "Local (Delhi NCR)",
                    "Delhi, Noida, Gurgaon, Ghaziabad, Faridabad",
                    &["DL", "UP", "HR"],
                    &[
                        "110001", "110002", "110003", "201301", "122001", "201001", "121001",
                    ],
                    40,
                    800,
                ),
                zone(
                    2,
                    "Regional (North India)",
                    "North Indian states excluding NCR",
                    &["UP", "HR", "PB", "RJ", "JK", "HP", "UT"],
                    &[],
                    60,
                    1_000,
                ),
                zone(
                    3,
                    "South India",
                    "Southern states of India",
                    &["TN", "KL", "KA", "AP", "TG"],
                    &[],
                    80,
                    1_200,
                ),
                zone(
                    4,
                    "West India",
                    "Western states of India",
                    &["MH", "GJ", "MP", "CG"],
                    &[],
                    70,
                    1_100,
                ),
                zone(
                    5,
                    "East India",
                    "Eastern states of India",
                    &["WB", "BR", "JH", "OR"],
                    &[],
                    75,
                    1_150,
                ),
                zone(
                    6,
                    "North East India",
                    "North Eastern states",
                    &["AS", "AR", "MN", "ML", "MZ", "NL", "TR", "SK"],
                    &[],
                    100,
                    1_500,
                ),
                zone(
                    7,
                    "Island Territories",
                    "Andaman, Nicobar, Lakshadweep",
                    &["AN", "LD"],
                    &[],
                    150,
                    2_000,
                ),
            ],
            methods: vec![
                method(1, "Standard Delivery", "3-5 business days", 5, 10_000, 5),
                method(2, "Express Delivery", "2-3 business days", 3, 15_000, 3),
                method(3, "Premium Express", "1-2 business days", 2, 20_000, 2),
            ],
            rates: vec![
                // Local (Delhi NCR) - Standard
                rate(1, 1, 1, 0, Some(1), 40, 10),
                rate(2, 1, 1, 1, Some(3), 50, 15),
                rate(3, 1, 1, 3, None, 80, 20),
                // Local (Delhi NCR) - Express
                rate(4, 1, 2, 0, Some(2), 60, 20),
                rate(5, 1, 2, 2, None, 100, 30),
                // Regional (North India) - Standard
                rate(6, 2, 1, 0, Some(2), 60, 15),
                rate(7, 2, 1, 2, None, 90, 25),
                // South India - Standard
                rate(8, 3, 1, 0, Some(2), 80, 20),
                rate(9, 3, 1, 2, None, 120, 30),
                // West India - Standard
                rate(10, 4, 1, 0, Some(2), 70, 18),
                rate(11, 4, 1, 2, None, 106, 28),
                // East India - Standard
                rate(12, 5, 1, 0, Some(2), 75, 19),
                rate(13, 5, 1, 2, None, 113, 29),
                // North East - Standard
                rate(14, 6, 1, 0, Some(2), 100, 25),
                rate(15, 6, 1, 2, None, 150, 35),
                // Island Territories - Standard
                rate(16, 7, 1, 0, Some(2), 150, 40),
                rate(17, 7, 1, 2, None, 230, 50),
            ],
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_india_default_is_valid() {
        assert!(ShippingConfig::india_default().validate().is_ok());
    }

    #[test]
    fn test_rejects_rate_with_unknown_zone() {
        let mut config = ShippingConfig::india_default();
        config.rates[0].zone_id = 999;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_rate_with_unknown_method() {
        let mut config = ShippingConfig::india_default();
        config.rates[0].method_id = 999;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_band_gap() {
        let mut config = ShippingConfig::india_default();
        // Remove the 1-3kg NCR Standard band, leaving 0-1kg and 3+kg
        config.rates.retain(|r| r.id != 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ShippingConfig::india_default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = ShippingConfig::from_json(&json).unwrap();

        assert_eq!(parsed.zones.len(), 7);
        assert_eq!(parsed.methods.len(), 3);
        assert_eq!(parsed.rates.len(), 17);
    }

    #[test]
    fn test_json_defaults_apply() {
        // Minimal zone: omitted is_active / threshold / metros default
        let json = r#"{
            "zones": [{"id": 1, "name": "Z", "states": ["DL"], "base_cost": 4000}],
            "methods": [{"id": 1, "name": "Standard", "estimated_days": 5,
                         "cost_multiplier_bps": 10000}],
            "rates": [{"id": 1, "zone_id": 1, "method_id": 1, "min_weight": 0,
                       "base_cost": 4000, "per_kg_cost": 1000,
                       "insurance_rate_bps": 200}]
        }"#;
        let config = ShippingConfig::from_json(json).unwrap();

        assert!(config.zones[0].is_active);
        assert!(config.zones[0].free_shipping_threshold.is_none());
        assert!(config.rates[0].max_weight.is_none());
    }

    #[test]
    fn test_name_lookups() {
        let config = ShippingConfig::india_default();
        assert_eq!(config.zone_name(1), "Local (Delhi NCR)");
        assert_eq!(config.method_name(3), "Premium Express");
        assert_eq!(config.zone_name(42), "zone #42");
    }
}
