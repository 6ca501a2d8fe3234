use axum::Router;

pub mod products;
pub mod seed;
pub mod system;

/// Router for the catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/seed", seed::router())
}
