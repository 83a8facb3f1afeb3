//! # Availability Service
//!
//! Read side of the reservation engine: how many units are free, and
//! what one shopper's hold looks like.
//!
//! ## Availability Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product: total_quantity = 5                                            │
//! │                                                                         │
//! │  Live holds:  alice 2 units, bob 1 unit                                 │
//! │                                                                         │
//! │  Anonymous shopper:  available = 5 - (2 + 1)        = 2                 │
//! │  Alice asks:         available = 5 - (2 + 1) + 2    = 4                 │
//! │                       (her own hold is hers to re-spend)                │
//! │                                                                         │
//! │  Every read sweeps lapsed holds first, so an abandoned hold stops       │
//! │  counting the moment anyone looks.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use thrift_core::validation::validate_holder_id;
use thrift_core::{Availability, CoreError, Product, Reservation, ReservationStatus};

/// Read-only availability queries over products and live holds.
///
/// ## Usage
/// ```rust,ignore
/// let svc = AvailabilityService::new(pool);
/// let free = svc.available_units("product-id").await?;
/// let status = svc.reservation_status("product-id", Some("user-42")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AvailabilityService {
    pool: SqlitePool,
}

impl AvailabilityService {
    /// Creates a new AvailabilityService.
    pub fn new(pool: SqlitePool) -> Self {
        AvailabilityService { pool }
    }

    /// Units free to reserve right now, net of live holds.
    pub async fn available_units(&self, product_id: &str) -> EngineResult<i64> {
        Ok(self.availability(product_id).await?.available_units)
    }

    /// Availability snapshot for a product page.
    pub async fn availability(&self, product_id: &str) -> EngineResult<Availability> {
        let product = self.load_product(product_id).await?;
        let reserved = self.reserved_units(product_id, None).await?;

        Ok(Availability {
            available_units: (product.total_quantity - reserved).max(0),
            total_units: product.total_quantity,
        })
    }

    /// Whether a holder could reserve the given quantity right now.
    ///
    /// A pre-flight check only: the answer can go stale the moment it is
    /// returned. `ReservationStore::reserve` re-checks inside its
    /// transaction and is the authority.
    pub async fn can_reserve(
        &self,
        product_id: &str,
        holder_id: &str,
        quantity: i64,
    ) -> EngineResult<bool> {
        validate_holder_id(holder_id)?;
        let holder_id = holder_id.trim();

        let product = self.load_product(product_id).await?;
        if !product.is_available || quantity < 1 {
            return Ok(false);
        }

        if product.is_unique() {
            let held_by_other = self
                .reserved_units(product_id, Some(holder_id))
                .await?;
            return Ok(held_by_other == 0 && quantity <= 1);
        }

        let reserved_by_others = self.reserved_units(product_id, Some(holder_id)).await?;
        let available = (product.total_quantity - reserved_by_others).max(0);
        Ok(quantity <= available)
    }

    /// Full reservation status as one shopper sees it.
    ///
    /// `holder_id` is `None` for anonymous visitors; they get the global
    /// availability with no own-hold details.
    pub async fn reservation_status(
        &self,
        product_id: &str,
        holder_id: Option<&str>,
    ) -> EngineResult<ReservationStatus> {
        let now = Utc::now();
        let product = self.load_product(product_id).await?;

        let own = match holder_id {
            Some(holder) => {
                validate_holder_id(holder)?;
                self.own_hold(product_id, holder.trim()).await?
            }
            None => None,
        };

        let reserved = self.reserved_units(product_id, None).await?;
        let mut available = (product.total_quantity - reserved).max(0);

        // The holder's own units are theirs to re-spend
        if let Some(hold) = &own {
            available += hold.quantity;
        }

        debug!(product_id = %product_id, available = %available,
               own_hold = own.is_some(), "Reservation status");

        Ok(ReservationStatus {
            is_reserved: own.is_some() || available == 0,
            is_own_reservation: own.is_some(),
            quantity: own.as_ref().map(|h| h.quantity),
            expires_at: own.as_ref().map(|h| h.expires_at),
            time_remaining: own.as_ref().map(|h| h.time_remaining(now)),
            available_units: available,
            total_units: product.total_quantity,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Loads a product, sweeping its lapsed holds first.
    ///
    /// Delisted (sold out) products still answer status queries; only a
    /// missing row is an error.
    async fn load_product(&self, product_id: &str) -> EngineResult<Product> {
        let now = Utc::now();

        // Lazy expiry: flip lapsed holds before any counting
        sqlx::query(
            r#"
            UPDATE reservations
            SET is_active = 0
            WHERE product_id = ?1 AND is_active = 1 AND expires_at <= ?2
            "#,
        )
        .bind(product_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, price_cents, weight_grams,
                total_quantity, is_available, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EngineError::Core(CoreError::ProductNotFound(product_id.to_string())))
    }

    /// Sum of live held units, optionally excluding one holder.
    async fn reserved_units(
        &self,
        product_id: &str,
        exclude_holder: Option<&str>,
    ) -> EngineResult<i64> {
        let reserved: i64 = match exclude_holder {
            Some(holder) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(quantity), 0)
                    FROM reservations
                    WHERE product_id = ?1 AND holder_id != ?2 AND is_active = 1
                    "#,
                )
                .bind(product_id)
                .bind(holder)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(quantity), 0)
                    FROM reservations
                    WHERE product_id = ?1 AND is_active = 1
                    "#,
                )
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(reserved)
    }

    async fn own_hold(
        &self,
        product_id: &str,
        holder_id: &str,
    ) -> EngineResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT
                id, product_id, holder_id, quantity,
                created_at, expires_at, is_active, extension_count, max_extensions
            FROM reservations
            WHERE product_id = ?1 AND holder_id = ?2 AND is_active = 1
            "#,
        )
        .bind(product_id)
        .bind(holder_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
