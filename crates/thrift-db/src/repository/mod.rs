//! # Repositories
//!
//! Table-level data access. Business flows that span tables live in
//! [`crate::availability`] and [`crate::checkout`].

pub mod product;
pub mod reservation;

pub use product::ProductRepository;
pub use reservation::ReservationStore;
