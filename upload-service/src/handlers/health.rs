use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.persister.storage().is_available().await {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "upload-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "upload-service",
                "error": format!(
                    "upload directory {} is not available",
                    state.config.storage.upload_dir.display()
                )
            })),
        )
    }
}
