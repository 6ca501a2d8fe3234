use async_trait::async_trait;
use thiserror::Error;

use catalog_core::ProductId;
use catalog_products::{Page, Product};

/// Storage operation error.
///
/// These are **infrastructure errors** raised at the storage boundary, classified
/// the same way for every backend so callers can map them without knowing which
/// store is in use.
///
/// ## Error Categories
///
/// - **Duplicate**: a unique constraint (title, slug) rejected the write
/// - **MissingValue**: a required column was left empty
/// - **InvalidValue**: a check constraint rejected a value (e.g. empty image url)
/// - **Backend**: anything else (connectivity, corrupt rows, poisoned locks)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("missing required value: {0}")]
    MissingValue(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistent collection of products and their images.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - enforce global uniqueness of `title` and `slug`
/// - keep images in the order they were supplied
/// - delete a product's images together with the product
/// - apply `insert` and `update` atomically: on error nothing is changed
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product and all of its images as one unit.
    async fn insert(&self, product: &Product) -> Result<(), StoreError>;

    /// One page of products, ordered by title.
    async fn list(&self, page: Page) -> Result<Vec<Product>, StoreError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// First product whose title or slug equals `term` exactly.
    async fn find_by_title_or_slug(&self, term: &str) -> Result<Option<Product>, StoreError>;

    /// Overwrite the stored columns of `product`.
    ///
    /// When `replace_images` is set, the stored images are deleted and replaced by
    /// `product.images` in the same transaction. Returns `false` when no product
    /// with that id exists.
    async fn update(&self, product: &Product, replace_images: bool) -> Result<bool, StoreError>;

    /// Delete a product (and its images). Returns `false` when nothing was deleted.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Delete every product. Returns the number of products removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}
