use crate::error::BlobError;
use crate::transport::http::handlers::common::failure;
use crate::transport::http::types::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

/// Serves an uploaded file. The key arrives percent-decoded, so both
/// `/o/paintings%2Fa.jpg` and `/o/paintings/a.jpg` resolve.
#[utoipa::path(
    get,
    path = "/o/{key}",
    params(("key" = String, Path, description = "Blob key, e.g. paintings/a.jpg")),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "Malformed key"),
        (status = 404, description = "No such file")
    )
)]
pub async fn download_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let key = key.trim_start_matches('/');
    match state.admin.blobs().download(key).await {
        Ok(blob) => {
            let content_type = blob
                .content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let etag = format!("\"{}\"", blob.etag());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type), (header::ETAG, etag)],
                blob.bytes,
            )
                .into_response()
        }
        Err(BlobError::NotFound(k)) => failure(StatusCode::NOT_FOUND, format!("No file at '{}'", k)),
        Err(e @ BlobError::InvalidKey(_)) => failure(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::warn!(key, error = %e, "blob download failed");
            failure(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
