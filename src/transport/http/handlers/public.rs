use crate::transport::http::handlers::common::{manager_error, ok};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::{Path, State};
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/public/{collection}",
    params(("collection" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Documents, capped per collection", body = ApiResponse),
        (status = 404, description = "Unknown collection", body = ApiResponse),
        (status = 502, description = "Store fetch failed", body = ApiResponse)
    )
)]
pub async fn list_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> impl IntoResponse {
    match state.public.list(collection.trim()).await {
        Ok(records) => ok(&records),
        Err(e) => manager_error(&e, None),
    }
}

#[utoipa::path(
    get,
    path = "/api/public/videos/active",
    responses(
        (status = 200, description = "The splash video, or null", body = ApiResponse),
        (status = 502, description = "Store fetch failed", body = ApiResponse)
    )
)]
pub async fn active_video_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.public.active_video().await {
        Ok(video) => ok(&video),
        Err(e) => manager_error(&e, None),
    }
}

#[utoipa::path(
    get,
    path = "/api/public/exhibitions/grouped",
    responses(
        (status = 200, description = "Archived exhibitions by type", body = ApiResponse),
        (status = 502, description = "Store fetch failed", body = ApiResponse)
    )
)]
pub async fn grouped_exhibitions_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.public.grouped_exhibitions().await {
        Ok(groups) => ok(&groups),
        Err(e) => manager_error(&e, None),
    }
}

#[utoipa::path(
    get,
    path = "/api/public/upcoming_exhibitions/featured",
    responses(
        (status = 200, description = "The featured upcoming exhibition, or null", body = ApiResponse),
        (status = 502, description = "Store fetch failed", body = ApiResponse)
    )
)]
pub async fn featured_upcoming_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.public.featured_upcoming().await {
        Ok(exhibition) => ok(&exhibition),
        Err(e) => manager_error(&e, None),
    }
}
