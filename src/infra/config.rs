//! Centralized configuration (environment variables + defaults).
//!
//! Call [`load_dotenv`] once at startup; every other function reads the
//! process environment directly.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

/// Default upload ceiling: 25 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Which document store the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!(
                "DOCUMENT_STORE must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

/// Loads `.env` if present. Missing files are not an error.
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Document store backend (`DOCUMENT_STORE`, default `postgres`).
pub fn store_backend() -> anyhow::Result<StoreBackend> {
    var("DOCUMENT_STORE")
        .map(|v| v.parse())
        .unwrap_or(Ok(StoreBackend::Postgres))
}

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> anyhow::Result<String> {
    var("DATABASE_URL").context("DATABASE_URL must be set when DOCUMENT_STORE=postgres")
}

/// Directory the file-backed blob store writes under.
pub fn blob_root() -> PathBuf {
    var("BLOB_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./blobs"))
}

/// Base of every download URL handed out for uploaded files.
pub fn public_base_url() -> String {
    var("PUBLIC_BASE_URL")
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:3000".to_string())
}

pub fn bind_address() -> String {
    var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string())
}

/// Path the admin surface is mounted at. Always starts with `/`, never ends with one.
pub fn admin_path() -> anyhow::Result<String> {
    let raw = var("ADMIN_PATH").unwrap_or_else(|| "/admin".to_string());
    normalize_admin_path(&raw)
}

pub fn normalize_admin_path(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        bail!("ADMIN_PATH must not be the site root");
    }
    if trimmed
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/')))
    {
        bail!("ADMIN_PATH contains unsupported characters: '{}'", raw);
    }
    Ok(format!("/{}", trimmed))
}

pub fn max_upload_bytes() -> anyhow::Result<usize> {
    match var("MAX_UPLOAD_BYTES") {
        Some(v) => {
            let n = v
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_BYTES must be a byte count, got '{}'", v))?;
            Ok(n.max(1))
        }
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
    }
}

/// JSON log lines instead of the human-readable format.
pub fn log_json() -> bool {
    var("LOG_JSON")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
