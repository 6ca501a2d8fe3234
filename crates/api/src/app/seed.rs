//! Reset the catalog to the fixed seed set.

use futures::future::try_join_all;

use catalog_infra::seed::seed_products;

use crate::app::services::{AppServices, ServiceError};

/// Delete every product, then insert the seed products concurrently.
///
/// Returns the number of products inserted. Fails with `Forbidden` in production
/// before anything is touched.
pub async fn run_seed(services: &AppServices) -> Result<usize, ServiceError> {
    let products = seed_products().map_err(|e| ServiceError::Internal(format!("seed data: {e}")))?;

    services.delete_all_products().await?;

    let ids = try_join_all(products.into_iter().map(|p| services.create_product(p)))
        .await
        .map_err(|e| match e {
            ServiceError::Internal(msg) => ServiceError::Internal(msg),
            other => ServiceError::Internal(format!("seed insert failed: {other}")),
        })?;

    tracing::info!(inserted = ids.len(), "seed executed");
    Ok(ids.len())
}
