use crate::app::admin_service::MountReport;
use crate::app::public_site::ExhibitionGroups;
use crate::domain::mirror::{FormDraft, MirrorSnapshot, Phase};
use crate::transport::http::handlers::{admin, blobs, health, public};
use crate::transport::http::types::{ApiResponse, AppState, ConfirmRequest, SaveRequest, UploadPayload};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        admin::list_managers_handler,
        admin::get_manager_handler,
        admin::load_handler,
        admin::edit_handler,
        admin::cancel_handler,
        admin::save_handler,
        admin::request_delete_handler,
        admin::confirm_delete_handler,
        public::list_handler,
        public::active_video_handler,
        public::grouped_exhibitions_handler,
        public::featured_upcoming_handler,
        blobs::download_handler
    ),
    components(schemas(
        ApiResponse,
        SaveRequest,
        UploadPayload,
        ConfirmRequest,
        MirrorSnapshot,
        Phase,
        FormDraft,
        MountReport,
        ExhibitionGroups
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

/// Builds the HTTP surface. `admin_path` is already normalized
/// (leading slash, no trailing slash); the admin routes hang off it.
pub fn create_router(app_state: AppState, admin_path: &str) -> Router {
    let at = |suffix: &str| format!("{}{}", admin_path, suffix);

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(admin_path, get(admin::list_managers_handler))
        .route(&at("/:collection"), get(admin::get_manager_handler))
        .route(&at("/:collection/load"), post(admin::load_handler))
        .route(&at("/:collection/edit/:id"), post(admin::edit_handler))
        .route(&at("/:collection/cancel"), post(admin::cancel_handler))
        .route(&at("/:collection/save"), post(admin::save_handler))
        .route(&at("/:collection/delete/:id"), post(admin::request_delete_handler))
        .route(&at("/:collection/confirm-delete"), post(admin::confirm_delete_handler))
        .route("/api/public/:collection", get(public::list_handler))
        .route("/api/public/videos/active", get(public::active_video_handler))
        .route(
            "/api/public/exhibitions/grouped",
            get(public::grouped_exhibitions_handler),
        )
        .route(
            "/api/public/upcoming_exhibitions/featured",
            get(public::featured_upcoming_handler),
        )
        .route("/o/*key", get(blobs::download_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
