//! # Reservation Store
//!
//! Write path for time-limited holds: reserve, adjust, extend, release.
//!
//! ## Hold Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Reservation Lifecycle                             │
//! │                                                                         │
//! │  reserve(product, holder, qty)                                         │
//! │       │  one row per (product, holder); re-reserve updates in place    │
//! │       ▼                                                                 │
//! │  ACTIVE (expires_at = now + 15 min)                                    │
//! │       │                                                                 │
//! │       ├── extend() ──► expires_at += 5 min (once by default)           │
//! │       ├── set_quantity(new_qty) ──► fresh 15 min window                │
//! │       ├── set_quantity(0) / release() ──► INACTIVE                     │
//! │       ├── commit ──► consumed (INACTIVE, stock decremented)            │
//! │       └── clock passes expires_at ──► lapsed                           │
//! │                                                                         │
//! │  Lapsed holds are swept lazily: every operation first flips            │
//! │  expired rows to is_active = 0. There is no background timer; a        │
//! │  hold nobody asks about simply stays lapsed until someone does.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Every decision runs inside one transaction: sweep, availability
//! check, and upsert see a single consistent snapshot, and SQLite's
//! single writer serializes racing holders. A writer that cannot get
//! the lock within the busy timeout surfaces `DbError::LockTimeout`.

use chrono::{Duration, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use thrift_core::validation::{validate_holder_id, validate_quantity, validate_uuid};
use thrift_core::{
    CoreError, Product, Reservation, DEFAULT_EXTENSION_MINUTES, DEFAULT_HOLD_TTL_MINUTES,
    DEFAULT_MAX_EXTENSIONS,
};

/// Store for reservation write operations.
///
/// ## Usage
/// ```rust,ignore
/// let store = ReservationStore::new(pool);
/// let hold = store.reserve(&product_id, "user-42", 2).await?;
/// store.extend(&hold.id, "user-42").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReservationStore {
    pool: SqlitePool,
}

impl ReservationStore {
    /// Creates a new ReservationStore.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationStore { pool }
    }

    // =========================================================================
    // Reserve / Adjust
    // =========================================================================

    /// Places or replaces a hold on a product.
    ///
    /// A holder has at most one hold per product; reserving again
    /// replaces the quantity and starts a fresh 15-minute window.
    ///
    /// ## Errors
    /// * `ProductNotFound` - unknown id or delisted product
    /// * `AlreadyReserved` - unique item held by someone else
    /// * `InsufficientAvailability` - fewer free units than requested
    pub async fn reserve(
        &self,
        product_id: &str,
        holder_id: &str,
        quantity: i64,
    ) -> EngineResult<Reservation> {
        validate_quantity(quantity)?;
        self.decide_quantity(product_id, holder_id, quantity).await
    }

    /// Sets the held quantity, releasing the hold when it drops to zero.
    ///
    /// Drives the cart flow: changing a line's quantity re-decides the
    /// hold, removing the line releases it. Only the INCREMENT over the
    /// holder's existing hold must be free; shrinking always succeeds.
    ///
    /// ## Returns
    /// * `Ok(Some(reservation))` - hold now at the requested quantity
    /// * `Ok(None)` - quantity was 0, hold released
    pub async fn set_quantity(
        &self,
        product_id: &str,
        holder_id: &str,
        quantity: i64,
    ) -> EngineResult<Option<Reservation>> {
        if quantity == 0 {
            self.release_product(product_id, holder_id).await?;
            return Ok(None);
        }
        validate_quantity(quantity)?;
        Ok(Some(
            self.decide_quantity(product_id, holder_id, quantity).await?,
        ))
    }

    /// The shared reserve/adjust transaction. `quantity` is >= 1 here.
    async fn decide_quantity(
        &self,
        product_id: &str,
        holder_id: &str,
        quantity: i64,
    ) -> EngineResult<Reservation> {
        validate_holder_id(holder_id)?;
        let holder_id = holder_id.trim();
        let now = Utc::now();

        debug!(product_id = %product_id, holder_id = %holder_id, quantity = %quantity,
               "Deciding reservation quantity");

        let mut tx = self.pool.begin().await?;

        sweep_product(&mut tx, product_id).await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, price_cents, weight_grams,
                total_quantity, is_available, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .filter(|p| p.is_available)
        .ok_or_else(|| EngineError::Core(CoreError::ProductNotFound(product_id.to_string())))?;

        // Unique items are all-or-nothing: any live hold by someone else
        // blocks every quantity.
        if product.is_unique() {
            let held_by_other: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM reservations
                WHERE product_id = ?1 AND holder_id != ?2 AND is_active = 1
                "#,
            )
            .bind(product_id)
            .bind(holder_id)
            .fetch_one(&mut *tx)
            .await?;

            if held_by_other > 0 {
                return Err(EngineError::Core(CoreError::AlreadyReserved {
                    product_id: product_id.to_string(),
                }));
            }
        }

        // The holder's own live units count toward their own budget:
        // bumping 2 → 3 only needs one more free unit.
        let reserved_by_others: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM reservations
            WHERE product_id = ?1 AND holder_id != ?2 AND is_active = 1
            "#,
        )
        .bind(product_id)
        .bind(holder_id)
        .fetch_one(&mut *tx)
        .await?;

        let available = (product.total_quantity - reserved_by_others).max(0);
        if quantity > available {
            return Err(EngineError::Core(CoreError::InsufficientAvailability {
                available,
                requested: quantity,
            }));
        }

        let expires_at = now + Duration::minutes(DEFAULT_HOLD_TTL_MINUTES);
        let id = Uuid::new_v4().to_string();

        // One row per (product, holder), reactivated in place. The
        // extension budget survives only when a LIVE hold keeps the same
        // quantity; a new quantity (or a lapsed row) is a new decision
        // and starts from zero extensions.
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (
                id, product_id, holder_id, quantity,
                created_at, expires_at, is_active, extension_count, max_extensions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 0, ?7)
            ON CONFLICT (product_id, holder_id) DO UPDATE SET
                quantity = excluded.quantity,
                expires_at = excluded.expires_at,
                is_active = 1,
                extension_count = CASE
                    WHEN reservations.is_active = 1
                         AND reservations.quantity = excluded.quantity
                    THEN reservations.extension_count
                    ELSE 0
                END,
                created_at = CASE
                    WHEN reservations.is_active = 1 THEN reservations.created_at
                    ELSE excluded.created_at
                END,
                max_extensions = excluded.max_extensions
            RETURNING
                id, product_id, holder_id, quantity,
                created_at, expires_at, is_active, extension_count, max_extensions
            "#,
        )
        .bind(&id)
        .bind(product_id)
        .bind(holder_id)
        .bind(quantity)
        .bind(now)
        .bind(expires_at)
        .bind(DEFAULT_MAX_EXTENSIONS)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(reservation_id = %reservation.id, expires_at = %reservation.expires_at,
               "Reservation decided");

        Ok(reservation)
    }

    // =========================================================================
    // Extend
    // =========================================================================

    /// Extends a live hold by five minutes.
    ///
    /// Extension pushes out the CURRENT deadline; extending early never
    /// shortens the hold. The budget (one extension by default) stops a
    /// shopper camping on a unique item.
    ///
    /// ## Errors
    /// * `ReservationNotFound` - unknown id, or not this holder's
    /// * `ReservationExpired` - lapsed before the extend arrived
    /// * `ExtensionLimitReached` - budget spent
    pub async fn extend(&self, reservation_id: &str, holder_id: &str) -> EngineResult<Reservation> {
        validate_uuid(reservation_id)?;
        validate_holder_id(holder_id)?;
        let holder_id = holder_id.trim();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT
                id, product_id, holder_id, quantity,
                created_at, expires_at, is_active, extension_count, max_extensions
            FROM reservations
            WHERE id = ?1 AND holder_id = ?2 AND is_active = 1
            "#,
        )
        .bind(reservation_id)
        .bind(holder_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            EngineError::Core(CoreError::ReservationNotFound(reservation_id.to_string()))
        })?;

        if reservation.is_expired(now) {
            sqlx::query("UPDATE reservations SET is_active = 0 WHERE id = ?1")
                .bind(reservation_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Err(EngineError::Core(CoreError::ReservationExpired(
                reservation_id.to_string(),
            )));
        }

        if !reservation.can_extend() {
            return Err(EngineError::Core(CoreError::ExtensionLimitReached {
                used: reservation.extension_count,
                max: reservation.max_extensions,
            }));
        }

        let new_expiry = reservation.expires_at + Duration::minutes(DEFAULT_EXTENSION_MINUTES);

        let updated = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET expires_at = ?2, extension_count = extension_count + 1
            WHERE id = ?1
            RETURNING
                id, product_id, holder_id, quantity,
                created_at, expires_at, is_active, extension_count, max_extensions
            "#,
        )
        .bind(reservation_id)
        .bind(new_expiry)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(reservation_id = %reservation_id, expires_at = %updated.expires_at,
               extensions = %updated.extension_count, "Reservation extended");

        Ok(updated)
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Releases a hold by reservation id.
    ///
    /// Idempotency is the caller's concern: releasing an already
    /// released (or lapsed) hold is `ReservationNotFound`.
    pub async fn release(&self, reservation_id: &str, holder_id: &str) -> EngineResult<()> {
        validate_uuid(reservation_id)?;
        validate_holder_id(holder_id)?;

        let result = sqlx::query(
            "UPDATE reservations SET is_active = 0 WHERE id = ?1 AND holder_id = ?2 AND is_active = 1",
        )
        .bind(reservation_id)
        .bind(holder_id.trim())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::Core(CoreError::ReservationNotFound(
                reservation_id.to_string(),
            )));
        }

        debug!(reservation_id = %reservation_id, "Reservation released");
        Ok(())
    }

    /// Releases a holder's hold on a product, if any.
    ///
    /// ## Returns
    /// Whether a live hold was released.
    pub async fn release_product(&self, product_id: &str, holder_id: &str) -> EngineResult<bool> {
        validate_holder_id(holder_id)?;

        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET is_active = 0
            WHERE product_id = ?1 AND holder_id = ?2 AND is_active = 1
            "#,
        )
        .bind(product_id)
        .bind(holder_id.trim())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets the holder's live hold on a product, sweeping lapsed rows
    /// first.
    pub async fn get_active(
        &self,
        product_id: &str,
        holder_id: &str,
    ) -> EngineResult<Option<Reservation>> {
        validate_holder_id(holder_id)?;
        let now = Utc::now();

        self.sweep_expired().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT
                id, product_id, holder_id, quantity,
                created_at, expires_at, is_active, extension_count, max_extensions
            FROM reservations
            WHERE product_id = ?1 AND holder_id = ?2 AND is_active = 1 AND expires_at > ?3
            "#,
        )
        .bind(product_id)
        .bind(holder_id.trim())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// Flips every lapsed hold to inactive.
    ///
    /// ## Returns
    /// Number of holds swept.
    pub async fn sweep_expired(&self) -> EngineResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE reservations SET is_active = 0 WHERE is_active = 1 AND expires_at <= ?1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            debug!(swept = %swept, "Swept expired reservations");
        }
        Ok(swept)
    }
}

/// Sweeps lapsed holds for one product inside a transaction.
pub(crate) async fn sweep_product(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE reservations
        SET is_active = 0
        WHERE product_id = ?1 AND is_active = 1 AND expires_at <= ?2
        "#,
    )
    .bind(product_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
