// src/bin/api_server.rs

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use portfolio_admin::infra::config::{self, StoreBackend};
use portfolio_admin::infra::logging;
use portfolio_admin::transport;
use portfolio_admin::{
    AdminService, BlobStore, DocumentStore, FsBlobStore, InMemoryDocumentStore, ModelRegistry,
    PostgresDocumentStore,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    logging::init_tracing(config::log_json());

    let backend = config::store_backend()?;
    let admin_path = config::admin_path()?;
    let max_upload = config::max_upload_bytes()?;
    let base_url = config::public_base_url();
    let bind = config::bind_address();

    // --- Document Store ---
    println!("> Initializing document store ({:?})...", backend);
    let documents: Arc<dyn DocumentStore> = match backend {
        StoreBackend::Postgres => {
            let url = config::database_url()?;
            Arc::new(PostgresDocumentStore::connect(&url).await?)
        }
        StoreBackend::Memory => {
            println!("> Using the in-memory document store; data is lost on exit.");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    // --- Blob Store ---
    let blob_store = FsBlobStore::new(config::blob_root(), base_url.clone(), max_upload);
    blob_store.ensure_writable().await?;
    println!("> Blob store rooted at {}", blob_store.root().display());
    let blobs: Arc<dyn BlobStore> = Arc::new(blob_store);

    // --- Admin page: one manager per collection, loaded once at mount ---
    let registry = Arc::new(ModelRegistry::portfolio());
    let admin = Arc::new(AdminService::new(registry, documents, blobs));
    for report in admin.mount().await {
        match (report.loaded, report.error) {
            (Some(n), _) => println!("> Loaded {} ({} documents)", report.collection, n),
            (None, Some(e)) => eprintln!("> Could not load {}: {}", report.collection, e),
            (None, None) => {}
        }
    }

    // --- API Server Initialization ---
    println!("> Starting API server...");
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    // Base64 inflates uploads by 4/3; leave room for the rest of the body.
    let body_limit = max_upload / 3 * 4 + 64 * 1024;
    let app = transport::http::create_router(transport::http::AppState::new(admin), &admin_path)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    println!("> API server listening on http://{}", bind);
    println!("> Admin page at {}{}", base_url, admin_path);
    println!("> Swagger UI available at {}/swagger-ui", base_url);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n> Shutdown signal received (Ctrl+C)...");
            println!("> Graceful shutdown complete.");
        }
    }

    Ok(())
}
