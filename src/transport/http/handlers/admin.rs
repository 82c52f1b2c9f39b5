//! Admin surface: one set of endpoints per collection manager.
//!
//! Every successful call answers with the manager's snapshot so the page can
//! re-render from a single response. Failures carry the snapshot too.

use crate::domain::mirror::{CollectionMirror, Draft};
use crate::transport::http::handlers::common::{find_manager, json_422, manager_error, ok};
use crate::transport::http::types::{ApiResponse, AppState, ConfirmRequest, SaveRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

fn snapshot_of(manager: &CollectionMirror) -> Response {
    match manager.snapshot() {
        Ok(snapshot) => ok(&snapshot),
        Err(e) => manager_error(&e, None),
    }
}

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Snapshots of every manager, in page order", body = ApiResponse)
    )
)]
pub async fn list_managers_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.admin.snapshots() {
        Ok(snapshots) => ok(&snapshots),
        Err(e) => manager_error(&e, None),
    }
}

#[utoipa::path(
    get,
    path = "/admin/{collection}",
    params(("collection" = String, Path, description = "Collection name (e.g. paintings)")),
    responses(
        (status = 200, description = "Manager snapshot", body = ApiResponse),
        (status = 404, description = "Unknown collection", body = ApiResponse)
    )
)]
pub async fn get_manager_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> impl IntoResponse {
    match find_manager(&state, &collection) {
        Ok(manager) => snapshot_of(&manager),
        Err(resp) => resp,
    }
}

#[utoipa::path(
    post,
    path = "/admin/{collection}/load",
    params(("collection" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Collection reloaded from the store", body = ApiResponse),
        (status = 409, description = "Another operation is in flight", body = ApiResponse),
        (status = 502, description = "Store fetch failed; previous records kept", body = ApiResponse)
    )
)]
pub async fn load_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> impl IntoResponse {
    let manager = match find_manager(&state, &collection) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match manager.load().await {
        Ok(_) => snapshot_of(&manager),
        Err(e) => manager_error(&e, Some(&manager)),
    }
}

#[utoipa::path(
    post,
    path = "/admin/{collection}/edit/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Record copied into the form", body = ApiResponse),
        (status = 404, description = "Record not listed", body = ApiResponse)
    )
)]
pub async fn edit_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let manager = match find_manager(&state, &collection) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match manager.begin_edit(&id) {
        Ok(_) => snapshot_of(&manager),
        Err(e) => manager_error(&e, Some(&manager)),
    }
}

#[utoipa::path(
    post,
    path = "/admin/{collection}/cancel",
    params(("collection" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Form reset", body = ApiResponse)
    )
)]
pub async fn cancel_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> impl IntoResponse {
    let manager = match find_manager(&state, &collection) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match manager.cancel_edit() {
        Ok(()) => snapshot_of(&manager),
        Err(e) => manager_error(&e, Some(&manager)),
    }
}

#[utoipa::path(
    post,
    path = "/admin/{collection}/save",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = SaveRequest,
    responses(
        (status = 200, description = "Record created or updated", body = ApiResponse),
        (status = 400, description = "Validation failed; nothing was sent to the store", body = ApiResponse),
        (status = 409, description = "Another operation is in flight", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 502, description = "Upload or document write failed", body = ApiResponse)
    )
)]
pub async fn save_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    request: Result<Json<SaveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let manager = match find_manager(&state, &collection) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"id\"?: string, \"fields\": {...}, \"image\"?: {\"file_name\", \"data_base64\"}}",
            )
        }
    };

    let upload = match request.image.map(|p| p.into_blob()).transpose() {
        Ok(blob) => blob,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(message),
                }),
            )
                .into_response()
        }
    };
    let draft = Draft {
        id: request.id.filter(|id| !id.trim().is_empty()),
        fields: request.fields,
        upload,
    };

    match manager.save(draft).await {
        Ok(_) => snapshot_of(&manager),
        Err(e) => manager_error(&e, Some(&manager)),
    }
}

#[utoipa::path(
    post,
    path = "/admin/{collection}/delete/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Deletion awaits confirmation", body = ApiResponse),
        (status = 404, description = "Record not listed", body = ApiResponse),
        (status = 409, description = "Another operation is in flight", body = ApiResponse)
    )
)]
pub async fn request_delete_handler(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let manager = match find_manager(&state, &collection) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    match manager.request_remove(&id) {
        Ok(()) => snapshot_of(&manager),
        Err(e) => manager_error(&e, Some(&manager)),
    }
}

#[utoipa::path(
    post,
    path = "/admin/{collection}/confirm-delete",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Deleted, or declined without any store call", body = ApiResponse),
        (status = 409, description = "No deletion is awaiting confirmation", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 502, description = "File or document delete failed; record kept", body = ApiResponse)
    )
)]
pub async fn confirm_delete_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    request: Result<Json<ConfirmRequest>, JsonRejection>,
) -> impl IntoResponse {
    let manager = match find_manager(&state, &collection) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"confirm\": true|false}"),
    };
    match manager.confirm_remove(request.confirm).await {
        Ok(_) => snapshot_of(&manager),
        Err(e) => manager_error(&e, Some(&manager)),
    }
}
