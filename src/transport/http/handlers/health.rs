use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (document store reachable)", body = ApiResponse),
        (status = 503, description = "Service is unhealthy (document store unreachable)", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let probe = state.admin.registry().list_models().into_iter().next();
    let result = match probe {
        Some(collection) => state
            .admin
            .documents()
            .list_all(&collection, Some(1))
            .await
            .map(|_| ()),
        None => Ok(()),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(serde_json::json!({ "status": "ok" })),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                success: false,
                data: Some(serde_json::json!({ "status": "unhealthy" })),
                error: Some(format!("Document store probe failed: {}", e)),
            }),
        )
            .into_response(),
    }
}
