//! # Commit Coordinator
//!
//! The race-free order commit: turn a cart into real stock decrements,
//! all lines or none.
//!
//! ## Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_order(holder, [lineA x2, lineB x1])                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    sweep lapsed holds for A, B                                          │
//! │    UPDATE products SET total_quantity = total_quantity - 2              │
//! │      WHERE id = A AND total_quantity >= 2   ── conditional decrement    │
//! │      │                                                                  │
//! │      ├── 0 rows? stock moved under us → ROLLBACK, OutOfStock            │
//! │      │          (line B untouched, nothing was sold)                    │
//! │      ▼                                                                  │
//! │    same for B; re-derive is_available from the new quantity             │
//! │    consume the holder's holds on A and B                                │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The WHERE clause is the whole race story: two buyers of the last       │
//! │  unit both reach the UPDATE, SQLite serializes them, the second         │
//! │  finds total_quantity < requested and affects 0 rows. No             │
//! │  read-then-write window exists.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A hold is NOT required to commit: the shopper who never reserved
//! still buys if physical stock remains. Holds only influence what the
//! reserve path will promise, and any hold the buyer does have is
//! consumed so it stops counting against others.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::repository::reservation::sweep_product;
use thrift_core::validation::{validate_holder_id, validate_quantity};
use thrift_core::{CommittedLine, CoreError, OrderLine, ValidationError};

/// Coordinates the all-or-nothing stock commit at checkout.
///
/// ## Usage
/// ```rust,ignore
/// let lines = vec![OrderLine { product_id, quantity: 2 }];
/// let committed = db.checkout().commit_order("user-42", &lines).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CommitCoordinator {
    pool: SqlitePool,
}

impl CommitCoordinator {
    /// Creates a new CommitCoordinator.
    pub fn new(pool: SqlitePool) -> Self {
        CommitCoordinator { pool }
    }

    /// Commits an order: decrements stock for every line and consumes
    /// the buyer's holds, in one transaction.
    ///
    /// ## Errors
    /// * `ProductNotFound` - a line references an unknown product
    /// * `OutOfStock` - a line exceeds remaining stock; NOTHING was sold
    /// * `DbError::LockTimeout` - write lock contention; safe to retry
    pub async fn commit_order(
        &self,
        holder_id: &str,
        lines: &[OrderLine],
    ) -> EngineResult<Vec<CommittedLine>> {
        validate_holder_id(holder_id)?;
        let holder_id = holder_id.trim();

        if lines.is_empty() {
            return Err(EngineError::Core(CoreError::Validation(
                ValidationError::Required {
                    field: "lines".to_string(),
                },
            )));
        }
        for line in lines {
            validate_quantity(line.quantity)?;
        }

        debug!(holder_id = %holder_id, lines = lines.len(), "Committing order");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut committed = Vec::with_capacity(lines.len());

        for line in lines {
            sweep_product(&mut tx, &line.product_id).await?;

            // Conditional decrement: the WHERE guard makes overselling
            // impossible regardless of what any earlier read said.
            let result = sqlx::query(
                r#"
                UPDATE products
                SET
                    total_quantity = total_quantity - ?2,
                    is_available = CASE WHEN total_quantity - ?2 > 0 THEN 1 ELSE 0 END,
                    updated_at = ?3
                WHERE id = ?1 AND total_quantity >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping tx rolls back every earlier line
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT total_quantity FROM products WHERE id = ?1")
                        .bind(&line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return match available {
                    None => Err(EngineError::Core(CoreError::ProductNotFound(
                        line.product_id.clone(),
                    ))),
                    Some(available) => Err(EngineError::Core(CoreError::OutOfStock {
                        product_id: line.product_id.clone(),
                        available,
                        requested: line.quantity,
                    })),
                };
            }

            let remaining: i64 =
                sqlx::query_scalar("SELECT total_quantity FROM products WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_one(&mut *tx)
                    .await?;

            // The buyer's hold is fulfilled, not lapsed: consume it so
            // it stops counting against other shoppers
            sqlx::query(
                r#"
                UPDATE reservations
                SET is_active = 0
                WHERE product_id = ?1 AND holder_id = ?2 AND is_active = 1
                "#,
            )
            .bind(&line.product_id)
            .bind(holder_id)
            .execute(&mut *tx)
            .await?;

            committed.push(CommittedLine {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                remaining_stock: remaining,
            });
        }

        tx.commit().await?;

        info!(holder_id = %holder_id, lines = committed.len(), "Order committed");
        Ok(committed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use thrift_core::Product;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, id: &str, quantity: i64) {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: id.to_string(),
                title: format!("Tee {id}"),
                price_cents: 49_900,
                weight_grams: Some(180),
                total_quantity: quantity,
                is_available: quantity > 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn line(product_id: &str, quantity: i64) -> OrderLine {
        OrderLine {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn core_err(err: EngineError) -> CoreError {
        match err {
            EngineError::Core(e) => e,
            EngineError::Db(e) => panic!("expected core error, got {e}"),
        }
    }

    #[tokio::test]
    async fn test_commit_decrements_and_consumes_hold() {
        let db = test_db().await;
        seed_product(&db, "p1", 5).await;

        db.reservations().reserve("p1", "alice", 2).await.unwrap();

        let committed = db
            .checkout()
            .commit_order("alice", &[line("p1", 2)])
            .await
            .unwrap();

        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].remaining_stock, 3);

        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.total_quantity, 3);
        assert!(product.is_available);

        // The hold was consumed, not left counting against others
        assert!(db
            .reservations()
            .get_active("p1", "alice")
            .await
            .unwrap()
            .is_none());
        assert_eq!(db.availability().available_units("p1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_commit_last_unit_delists_product() {
        let db = test_db().await;
        seed_product(&db, "p1", 1).await;

        db.checkout()
            .commit_order("alice", &[line("p1", 1)])
            .await
            .unwrap();

        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.total_quantity, 0);
        assert!(!product.is_available);
    }

    #[tokio::test]
    async fn test_commit_without_reservation_succeeds() {
        let db = test_db().await;
        seed_product(&db, "p1", 2).await;

        let committed = db
            .checkout()
            .commit_order("walk-in", &[line("p1", 1)])
            .await
            .unwrap();
        assert_eq!(committed[0].remaining_stock, 1);
    }

    #[tokio::test]
    async fn test_out_of_stock_rolls_back_all_lines() {
        let db = test_db().await;
        seed_product(&db, "p1", 5).await;
        seed_product(&db, "p2", 1).await;

        let err = core_err(
            db.checkout()
                .commit_order("alice", &[line("p1", 2), line("p2", 3)])
                .await
                .unwrap_err(),
        );

        match err {
            CoreError::OutOfStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, "p2");
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The first line was rolled back: nothing sold
        let p1 = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(p1.total_quantity, 5);
    }

    #[tokio::test]
    async fn test_commit_unknown_product() {
        let db = test_db().await;
        let err = core_err(
            db.checkout()
                .commit_order("alice", &[line("ghost", 1)])
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_commit_empty_order_rejected() {
        let db = test_db().await;
        let err = core_err(db.checkout().commit_order("alice", &[]).await.unwrap_err());
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_expired_hold_does_not_guarantee_stock() {
        let db = test_db().await;
        seed_product(&db, "p1", 1).await;

        let res = db.reservations().reserve("p1", "alice", 1).await.unwrap();

        // Backdate alice's hold, then bob buys the unit outright
        let past = Utc::now() - chrono::Duration::minutes(1);
        sqlx::query("UPDATE reservations SET expires_at = ?1 WHERE id = ?2")
            .bind(past)
            .bind(&res.id)
            .execute(db.pool())
            .await
            .unwrap();

        db.checkout()
            .commit_order("bob", &[line("p1", 1)])
            .await
            .unwrap();

        let err = core_err(
            db.checkout()
                .commit_order("alice", &[line("p1", 1)])
                .await
                .unwrap_err(),
        );
        assert!(matches!(err, CoreError::OutOfStock { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_commits_never_oversell() {
        let db = test_db().await;
        seed_product(&db, "p1", 10).await;

        let mut handles = Vec::new();
        for i in 0..50 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.checkout()
                    .commit_order(&format!("buyer-{i}"), &[line("p1", 1)])
                    .await
            }));
        }

        let mut sold = 0;
        let mut out_of_stock = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(EngineError::Core(CoreError::OutOfStock { .. })) => out_of_stock += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(sold, 10);
        assert_eq!(out_of_stock, 40);

        let product = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.total_quantity, 0);
        assert!(!product.is_available);
    }
}
