use crate::domain::mirror::CollectionMirror;
use crate::error::ManagerError;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

pub fn status_for(err: &ManagerError) -> StatusCode {
    match err {
        ManagerError::Validation(_) => StatusCode::BAD_REQUEST,
        ManagerError::NotFound { .. } => StatusCode::NOT_FOUND,
        ManagerError::Busy { .. } | ManagerError::InvalidState(_) => StatusCode::CONFLICT,
        ManagerError::Fetch { .. }
        | ManagerError::Upload(_)
        | ManagerError::Save { .. }
        | ManagerError::Delete { .. } => StatusCode::BAD_GATEWAY,
    }
}

pub fn ok<T: Serialize>(data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(value),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode response: {}", e),
        ),
    }
}

pub fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

/// Error envelope carrying the error code and, when available, the manager
/// snapshot after the failure (its message and form are what the page shows).
pub fn manager_error(err: &ManagerError, manager: Option<&CollectionMirror>) -> Response {
    let mut data = serde_json::json!({ "code": err.code() });
    if let Some(snapshot) = manager.and_then(|m| m.snapshot().ok()) {
        if let Ok(value) = serde_json::to_value(snapshot) {
            data["snapshot"] = value;
        }
    }
    (
        status_for(err),
        Json(ApiResponse {
            success: false,
            data: Some(data),
            error: Some(err.to_string()),
        }),
    )
        .into_response()
}

pub fn find_manager(state: &AppState, collection: &str) -> Result<Arc<CollectionMirror>, Response> {
    let name = collection.trim().to_lowercase();
    state.admin.manager(&name).ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            format!("Collection '{}' is not managed here", name),
        )
    })
}

pub fn json_422(err: JsonRejection, expected: &str) -> Response {
    failure(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid JSON body: {} (expected: {})", err, expected),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            status_for(&ManagerError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ManagerError::Busy {
                collection: "videos".into(),
                operation: "save"
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ManagerError::Upload("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&ManagerError::NotFound {
                label: "painting".into(),
                id: "a".into()
            }),
            StatusCode::NOT_FOUND
        );
    }
}
