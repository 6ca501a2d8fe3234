use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use catalog_core::{DomainError, ProductId};
use catalog_infra::{
    AppConfig, Environment, InMemoryProductStore, PostgresProductStore, ProductStore, StoreBackend,
    StoreError,
};
use catalog_products::{NewProduct, Page, Product, ProductChanges};

const PRODUCT_NOT_FOUND: &str = "The product does not exist";

/// Failure of a catalog operation, classified for the HTTP boundary.
///
/// - `Validation` / `Duplicate`: the caller sent something unacceptable (400)
/// - `NotFound`: nothing matched (404)
/// - `Forbidden`: refused in this environment (403)
/// - `Internal`: anything else; the detail is logged, never returned
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(detail) => ServiceError::Duplicate(detail),
            StoreError::MissingValue(detail) | StoreError::InvalidValue(detail) => {
                ServiceError::Validation(detail)
            }
            StoreError::Backend(detail) => ServiceError::Internal(detail),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

/// Catalog services shared by every request handler.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn ProductStore>,
    environment: Environment,
}

impl AppServices {
    pub fn new(store: Arc<dyn ProductStore>, environment: Environment) -> Self {
        Self { store, environment }
    }

    #[instrument(skip(self, input), fields(title = %input.title), err)]
    pub async fn create_product(&self, input: NewProduct) -> Result<ProductId, ServiceError> {
        let product = input.into_product(ProductId::new())?;
        self.store.insert(&product).await?;
        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product.id)
    }

    #[instrument(skip(self), fields(limit = page.limit(), offset = page.offset()), err)]
    pub async fn list_products(&self, page: Page) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.list(page).await?)
    }

    /// Resolve `term` as an id when it is a UUID, otherwise as an exact title or slug.
    #[instrument(skip(self), err)]
    pub async fn find_product(&self, term: &str) -> Result<Product, ServiceError> {
        let found = match term.parse::<ProductId>() {
            Ok(id) => self.store.find_by_id(id).await?,
            Err(_) => self.store.find_by_title_or_slug(term).await?,
        };
        found.ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    /// Merge `changes` into the stored product.
    ///
    /// When the changes carry an image list, the old images are replaced in the
    /// same transaction as the column update.
    #[instrument(skip(self, changes), fields(product_id = %id, replace_images = changes.replaces_images()), err)]
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<ProductId, ServiceError> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        let replace_images = changes.replaces_images();
        let next = changes.apply_to(&current)?;
        if !self.store.update(&next, replace_images).await? {
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()));
        }
        tracing::info!(slug = %next.slug, "product updated");
        Ok(id)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_product(&self, term: &str) -> Result<ProductId, ServiceError> {
        let product = self.find_product(term).await?;
        if !self.store.delete(product.id).await? {
            return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string()));
        }
        tracing::info!(product_id = %product.id, "product deleted");
        Ok(product.id)
    }

    /// Remove every product. Refused in production.
    #[instrument(skip(self), fields(environment = ?self.environment), err)]
    pub async fn delete_all_products(&self) -> Result<u64, ServiceError> {
        if self.environment.is_production() {
            return Err(ServiceError::Forbidden(
                "This action cannot be executed in production environment".to_string(),
            ));
        }
        let removed = self.store.delete_all().await?;
        tracing::warn!(removed, "all products deleted");
        Ok(removed)
    }
}

/// Wire the product store selected by `config`.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn ProductStore> = match &config.store {
        StoreBackend::Memory => {
            tracing::info!("using in-memory product store");
            Arc::new(InMemoryProductStore::new())
        }
        StoreBackend::Postgres(db) => {
            let store = PostgresProductStore::connect(db).await?;
            store.ensure_schema().await?;
            tracing::info!(host = %db.host, database = %db.name, "connected to postgres");
            Arc::new(store)
        }
    };
    Ok(AppServices::new(store, config.environment))
}
