use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use catalog_core::ProductId;
use catalog_products::Page;

use crate::app::{dto, errors};
use crate::app::services::{AppServices, ServiceError};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:term", get(get_product).patch(update_product).delete(delete_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let input = match body.into_new_product() {
        Ok(i) => i,
        Err(e) => return errors::service_error_to_response(ServiceError::from(e)),
    };

    match services.create_product(input).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "id": id.to_string(),
                "message": "Product created successfully",
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::PaginationQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };

    let page = match Page::new(query.limit, query.offset) {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(ServiceError::from(e)),
    };

    match services.list_products(page).await {
        Ok(products) => Json(serde_json::json!({
            "products": products.into_iter().map(dto::product_to_json).collect::<Vec<_>>(),
            "limit": page.limit(),
            "offset": page.offset(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(term): Path<String>,
) -> axum::response::Response {
    match services.find_product(&term).await {
        Ok(product) => Json(serde_json::json!({ "product": dto::product_to_json(product) })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match id.parse::<ProductId>() {
        Ok(id) => id,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    };

    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let changes = match body.into_changes() {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(ServiceError::from(e)),
    };

    match services.update_product(id, changes).await {
        Ok(id) => Json(serde_json::json!({
            "id": id.to_string(),
            "message": "Product updated successfully",
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(term): Path<String>,
) -> axum::response::Response {
    match services.delete_product(&term).await {
        Ok(id) => Json(serde_json::json!({
            "id": id.to_string(),
            "message": "Product deleted successfully",
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
