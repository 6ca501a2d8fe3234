use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};

use crate::app::{errors, seed, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/", get(execute_seed))
}

pub async fn execute_seed(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match seed::run_seed(&services).await {
        Ok(inserted) => Json(serde_json::json!({
            "message": "Seed executed successfully",
            "inserted": inserted,
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
