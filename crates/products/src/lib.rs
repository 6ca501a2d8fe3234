//! Catalog domain module.
//!
//! This crate contains business rules for products and their images, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod pagination;
pub mod product;
pub mod slug;

pub use pagination::{DEFAULT_PAGE_LIMIT, Page};
pub use product::{Gender, NewProduct, Product, ProductChanges, ProductImage};
pub use slug::normalize_slug;
