//! # thrift-db: Database Layer for the ThriftTees Engine
//!
//! This crate provides database access for the reservation and checkout
//! engine. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     ThriftTees Engine Data Flow                         │
//! │                                                                         │
//! │  API request (reserve / status / checkout)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     thrift-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │    Services    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Reservations   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Availability   │    │ 001_init.sql │  │   │
//! │  │   │ WAL + busy    │    │ Checkout       │    │ ...          │  │   │
//! │  │   │ timeout       │    │ Products       │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (products + reservations)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and combined engine error types
//! - [`repository`] - Product rows and the reservation store
//! - [`availability`] - Read side: free units, per-shopper status
//! - [`checkout`] - All-or-nothing stock commit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use thrift_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/thrift.db")).await?;
//!
//! let hold = db.reservations().reserve(&product_id, "user-42", 1).await?;
//! let status = db.availability().reservation_status(&product_id, Some("user-42")).await?;
//! let committed = db.checkout().commit_order("user-42", &order_lines).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, EngineError, EngineResult};
pub use pool::{Database, DbConfig};

// Service re-exports for convenience
pub use availability::AvailabilityService;
pub use checkout::CommitCoordinator;
pub use repository::product::ProductRepository;
pub use repository::reservation::ReservationStore;
