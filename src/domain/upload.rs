//! Uploads a draft's file to the blob store and hands back its download URL.

use std::sync::Arc;

use crate::domain::model::ImageSlot;
use crate::error::ManagerError;
use crate::storage::blob::{content_type_for, Blob, BlobStore};

#[derive(Clone)]
pub struct Uploader {
    blobs: Arc<dyn BlobStore>,
}

impl Uploader {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Uploads `blob` under `<slot prefix>/<file name>` and resolves its URL.
    ///
    /// Local checks (name, emptiness, MIME family) run before any store call.
    pub async fn upload(&self, slot: &ImageSlot, blob: &Blob) -> Result<String, ManagerError> {
        let key = blob_key(slot, blob)?;
        check_content_type(slot, blob)?;
        if blob.bytes.is_empty() {
            return Err(ManagerError::Upload(format!("'{}' is empty", blob.file_name)));
        }

        let retrieval_key = self
            .blobs
            .upload(&key, blob)
            .await
            .map_err(|e| ManagerError::Upload(e.to_string()))?;
        let url = self
            .blobs
            .resolve_url(&retrieval_key)
            .await
            .map_err(|e| ManagerError::Upload(e.to_string()))?;

        tracing::info!(key = %retrieval_key, bytes = blob.bytes.len(), "file uploaded");
        Ok(url)
    }
}

/// Collection-scoped key for `blob`; directory parts of the file name are dropped.
pub fn blob_key(slot: &ImageSlot, blob: &Blob) -> Result<String, ManagerError> {
    let name = blob
        .file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(ManagerError::Upload("file name is missing".to_string()));
    }
    Ok(format!("{}/{}", slot.key_prefix, name))
}

fn check_content_type(slot: &ImageSlot, blob: &Blob) -> Result<(), ManagerError> {
    let content_type = blob
        .content_type
        .as_deref()
        .or_else(|| content_type_for(&blob.file_name));
    match content_type {
        Some(ct) if ct.starts_with(slot.accept) => Ok(()),
        Some(ct) => Err(ManagerError::Upload(format!(
            "'{}' has type {}, expected {}*",
            blob.file_name, ct, slot.accept
        ))),
        None => Err(ManagerError::Upload(format!(
            "cannot tell the type of '{}', expected {}*",
            blob.file_name, slot.accept
        ))),
    }
}
