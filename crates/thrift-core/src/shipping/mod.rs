//! # Shipping
//!
//! Tiered shipping-rate calculation: destination → zone, shipment weight
//! → rate band, band cost × method multiplier + declared-value insurance.
//!
//! Everything here is pure and synchronous; the configuration is plain
//! data the caller loads once (JSON or [`config::ShippingConfig::india_default`])
//! and the calculator borrows.

pub mod calculator;
pub mod config;
pub mod rate;
pub mod zone;

pub use calculator::{CostBreakdown, ShippingCalculator, ShippingQuote};
pub use config::ShippingConfig;
pub use rate::{RateTable, ShippingMethod, ShippingRate};
pub use zone::{ShippingZone, ZoneResolver, DEFAULT_COUNTRY};
