//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Who writes products.total_quantity?                       │
//! │                                                                         │
//! │  CommitCoordinator  ──►  decrement inside the commit transaction        │
//! │  ProductRepository  ──►  restock() on cancellation / return             │
//! │  Nobody else.                                                           │
//! │                                                                         │
//! │  is_available is DERIVED: re-computed from total_quantity on every      │
//! │  stock write, never toggled on its own. A product with stock is         │
//! │  available; a product without stock is not.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, EngineResult};
use thrift_core::validation::validate_price_cents;
use thrift_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, title, price_cents, weight_grams,
                total_quantity, is_available, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// `is_available` is derived from `total_quantity`, whatever the
    /// caller set on the struct.
    pub async fn insert(&self, product: &Product) -> EngineResult<Product> {
        validate_price_cents(product.price_cents)?;

        debug!(id = %product.id, title = %product.title, "Inserting product");

        let is_available = product.total_quantity > 0;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, title, price_cents, weight_grams,
                total_quantity, is_available, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(product.price_cents)
        .bind(product.weight_grams)
        .bind(product.total_quantity)
        .bind(is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        let mut inserted = product.clone();
        inserted.is_available = is_available;
        Ok(inserted)
    }

    /// Returns stock to a product (order cancellation, return).
    ///
    /// The increment is relative, not absolute, so two concurrent
    /// restocks never lose an update. Re-derives `is_available`.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Restocking product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                total_quantity = total_quantity + ?2,
                is_available = CASE WHEN total_quantity + ?2 > 0 THEN 1 ELSE 0 END,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts available products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_available = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pool::{Database, DbConfig};
    use thrift_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(id: &str, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            title: format!("Vintage Tee {id}"),
            price_cents: 49_900,
            weight_grams: Some(180),
            total_quantity: quantity,
            is_available: quantity > 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("p1", 3)).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.title, "Vintage Tee p1");
        assert_eq!(found.total_quantity, 3);
        assert!(found.is_available);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_derives_availability() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = product("p1", 0);
        p.is_available = true; // caller lies; insert corrects it
        repo.insert(&p).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert!(!found.is_available);
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_price() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = product("p1", 3);
        p.price_cents = -1;

        let err = repo.insert(&p).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_restock_revives_sold_out_product() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("p1", 0)).await.unwrap();
        repo.restock("p1", 2).await.unwrap();

        let found = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.total_quantity, 2);
        assert!(found.is_available);
    }

    #[tokio::test]
    async fn test_restock_missing_product() {
        let db = test_db().await;
        let err = db.products().restock("nope", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
