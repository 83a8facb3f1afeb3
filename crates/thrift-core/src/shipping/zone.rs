//! # Shipping Zones
//!
//! Geographic zone definitions and destination-to-zone resolution.
//!
//! ## Resolution Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Destination { postal_code: "201301", state: "UP", country: "IN" }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Pass 1: metro postal codes ──► "201301" is Noida, listed under        │
//! │          Local (Delhi NCR)       the NCR zone despite state UP         │
//! │       │                                                                 │
//! │       ▼ (no metro match)                                                │
//! │  Pass 2: state codes ──► "UP" matches Regional (North India)           │
//! │       │                                                                 │
//! │       ▼ (no state match)                                                │
//! │  UnsupportedDestination                                                 │
//! │                                                                         │
//! │  Metro-before-state matters: NCR satellite cities belong to the        │
//! │  cheaper local zone even though their states also appear in the        │
//! │  regional zone.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ShippingError;
use crate::money::Money;
use crate::types::Destination;
use crate::validation::validate_postal_code;

/// Country assumed when a destination omits one.
pub const DEFAULT_COUNTRY: &str = "IN";

// =============================================================================
// Shipping Zone
// =============================================================================

/// A geographic shipping-cost bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingZone {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Two-letter state codes this zone covers.
    #[serde(default)]
    pub states: Vec<String>,

    /// Metro postal codes matched exactly, before any state match.
    #[serde(default)]
    pub metro_postal_codes: Vec<String>,

    /// Country codes this zone serves; empty means the default country.
    #[serde(default)]
    pub countries: Vec<String>,

    /// Fallback display cost; real pricing comes from the rate table.
    pub base_cost: Money,

    /// Order value at or above which shipping is free, if offered.
    #[serde(default)]
    pub free_shipping_threshold: Option<Money>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ShippingZone {
    fn serves_country(&self, country: &str) -> bool {
        let country = if country.is_empty() {
            DEFAULT_COUNTRY
        } else {
            country
        };
        if self.countries.is_empty() {
            return country.eq_ignore_ascii_case(DEFAULT_COUNTRY);
        }
        self.countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country))
    }

    fn matches_postal(&self, postal_code: &str) -> bool {
        self.metro_postal_codes.iter().any(|p| p == postal_code)
    }

    fn matches_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s.eq_ignore_ascii_case(state))
    }
}

// =============================================================================
// Zone Resolver
// =============================================================================

/// Maps a postal code / state / country triple to a configured zone.
#[derive(Debug, Clone)]
pub struct ZoneResolver<'a> {
    zones: &'a [ShippingZone],
}

impl<'a> ZoneResolver<'a> {
    pub fn new(zones: &'a [ShippingZone]) -> Self {
        ZoneResolver { zones }
    }

    /// Resolves a destination to its zone.
    ///
    /// Exact metro-postal-code match wins over state match; zones are
    /// scanned in configuration order, so the first match is
    /// deterministic when states appear in more than one zone.
    pub fn resolve(&self, destination: &Destination) -> Result<&'a ShippingZone, ShippingError> {
        let postal = destination.postal_code.trim();
        let state = destination.state.trim();
        let country = destination.country.trim();

        // The PIN format is known for the default country; a malformed
        // code there is undeliverable no matter what the state says.
        if (country.is_empty() || country.eq_ignore_ascii_case(DEFAULT_COUNTRY))
            && validate_postal_code(postal).is_err()
        {
            return Err(ShippingError::UnsupportedDestination {
                postal_code: postal.to_string(),
                state: state.to_string(),
            });
        }

        let candidates: Vec<&ShippingZone> = self
            .zones
            .iter()
            .filter(|z| z.is_active && z.serves_country(country))
            .collect();

        if let Some(zone) = candidates.iter().find(|z| z.matches_postal(postal)) {
            return Ok(*zone);
        }

        if let Some(zone) = candidates.iter().find(|z| z.matches_state(state)) {
            return Ok(*zone);
        }

        Err(ShippingError::UnsupportedDestination {
            postal_code: postal.to_string(),
            state: state.to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> Vec<ShippingZone> {
        vec![
            ShippingZone {
                id: 1,
                name: "Local (Delhi NCR)".to_string(),
                description: String::new(),
                states: vec!["DL".to_string()],
                metro_postal_codes: vec!["110001".to_string(), "201301".to_string()],
                countries: vec![],
                base_cost: Money::from_major(40),
                free_shipping_threshold: Some(Money::from_major(800)),
                is_active: true,
            },
            ShippingZone {
                id: 2,
                name: "Regional (North India)".to_string(),
                description: String::new(),
                states: vec!["UP".to_string(), "HR".to_string()],
                metro_postal_codes: vec![],
                countries: vec![],
                base_cost: Money::from_major(60),
                free_shipping_threshold: None,
                is_active: true,
            },
        ]
    }

    #[test]
    fn test_metro_postal_beats_state() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        // Noida PIN is in UP, but listed as an NCR metro postal code
        let dest = Destination::new("201301", "UP", "IN");
        assert_eq!(resolver.resolve(&dest).unwrap().id, 1);
    }

    #[test]
    fn test_state_match_fallback() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        let dest = Destination::new("226001", "UP", "IN");
        assert_eq!(resolver.resolve(&dest).unwrap().id, 2);
    }

    #[test]
    fn test_state_match_case_insensitive() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        let dest = Destination::new("122001", "hr", "IN");
        assert_eq!(resolver.resolve(&dest).unwrap().id, 2);
    }

    #[test]
    fn test_malformed_pin_rejected() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        // A valid state cannot rescue a malformed PIN
        let dest = Destination::new("1100", "DL", "IN");
        assert!(matches!(
            resolver.resolve(&dest),
            Err(ShippingError::UnsupportedDestination { .. })
        ));
    }

    #[test]
    fn test_unsupported_destination() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        let dest = Destination::new("999999", "XX", "IN");
        assert!(matches!(
            resolver.resolve(&dest),
            Err(ShippingError::UnsupportedDestination { .. })
        ));
    }

    #[test]
    fn test_foreign_country_unsupported() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        let dest = Destination::new("110001", "DL", "US");
        assert!(resolver.resolve(&dest).is_err());
    }

    #[test]
    fn test_empty_country_defaults() {
        let zones = zones();
        let resolver = ZoneResolver::new(&zones);

        let dest = Destination::new("110001", "DL", "");
        assert_eq!(resolver.resolve(&dest).unwrap().id, 1);
    }

    #[test]
    fn test_inactive_zone_skipped() {
        let mut zs = zones();
        zs[0].is_active = false;
        let resolver = ZoneResolver::new(&zs);

        // Metro code belongs to the inactive zone; no state fallback for DL
        let dest = Destination::new("110001", "DL", "IN");
        assert!(resolver.resolve(&dest).is_err());
    }
}
