use portfolio_admin::infra::config::{self, StoreBackend};
use portfolio_admin::{DocumentStore, FsBlobStore, ModelRegistry, PostgresDocumentStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Reads env vars (or .env):\n\
           DOCUMENT_STORE, DATABASE_URL, BLOB_ROOT, PUBLIC_BASE_URL,\n\
           BIND_ADDRESS, ADMIN_PATH, MAX_UPLOAD_BYTES, LOG_JSON\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    // Force-read config (nice error messages if something is off)
    let backend = config::store_backend()?;
    let admin_path = config::admin_path()?;
    let max_upload = config::max_upload_bytes()?;
    let base_url = config::public_base_url();

    println!("> Preflight:");
    println!("  DOCUMENT_STORE={:?}", backend);
    println!("  ADMIN_PATH={}", admin_path);
    println!("  PUBLIC_BASE_URL={}", base_url);
    println!("  BIND_ADDRESS={}", config::bind_address());
    println!("  MAX_UPLOAD_BYTES={}", max_upload);

    match backend {
        StoreBackend::Postgres => {
            let url = config::database_url()?;
            let store = PostgresDocumentStore::connect(&url)
                .await
                .map_err(|e| anyhow::anyhow!("Postgres is not reachable: {}", e))?;
            println!("  Postgres reachable; documents table ready.");
            for collection in ModelRegistry::portfolio().list_models() {
                let records = store.list_all(&collection, None).await?;
                println!("  {}: {} documents", collection, records.len());
            }
        }
        StoreBackend::Memory => {
            eprintln!("  Warning: in-memory document store; nothing survives a restart.");
        }
    }

    let blobs = FsBlobStore::new(config::blob_root(), base_url, max_upload);
    blobs
        .ensure_writable()
        .await
        .map_err(|e| anyhow::anyhow!("BLOB_ROOT {} is not writable: {}", blobs.root().display(), e))?;
    println!("  Blob root {} is writable.", blobs.root().display());

    println!("> Preflight OK.");
    Ok(())
}
