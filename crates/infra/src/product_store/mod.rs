//! Product storage boundary.
//!
//! `ProductStore` abstracts over where products live; the in-memory backend
//! serves tests and local development, the Postgres backend serves everything else.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;
pub use r#trait::{ProductStore, StoreError};
