//! Filesystem-backed blob store. Keys map to paths under a root directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{content_type_for, download_url, key_for_url, validate_key, Blob, BlobStore};
use crate::error::BlobError;

#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory and checks that it accepts writes.
    pub async fn ensure_writable(&self) -> Result<(), BlobError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let marker = self.root.join(".preflight");
        tokio::fs::write(&marker, b"ok").await?;
        tokio::fs::remove_file(&marker).await?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn not_found(key: &str, err: std::io::Error) -> BlobError {
    if err.kind() == ErrorKind::NotFound {
        BlobError::NotFound(key.to_string())
    } else {
        BlobError::Io(err)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, key: &str, blob: &Blob) -> Result<String, BlobError> {
        let path = self.path_for(key)?;
        if blob.bytes.len() > self.max_bytes {
            return Err(BlobError::TooLarge {
                size: blob.bytes.len(),
                limit: self.max_bytes,
            });
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &blob.bytes).await?;
        tracing::debug!(key, bytes = blob.bytes.len(), "blob written");
        Ok(key.to_string())
    }

    async fn resolve_url(&self, retrieval_key: &str) -> Result<String, BlobError> {
        let path = self.path_for(retrieval_key)?;
        tokio::fs::metadata(&path)
            .await
            .map_err(|e| not_found(retrieval_key, e))?;
        download_url(&self.base_url, retrieval_key)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found(key, e))
    }

    async fn download(&self, key: &str) -> Result<Blob, BlobError> {
        let path = self.path_for(key)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| not_found(key, e))?;
        let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
        let content_type = content_type_for(&file_name);
        Ok(Blob::new(file_name, content_type, bytes))
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        key_for_url(&self.base_url, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("portfolio-blobs-{}-{}", tag, std::process::id()))
    }

    #[tokio::test]
    async fn upload_resolve_delete() {
        let root = temp_root("cycle");
        let store = FsBlobStore::new(&root, "http://localhost:3000", 1024);
        let blob = Blob::new("a.jpg", Some("image/jpeg"), vec![1, 2, 3]);

        let key = store.upload("paintings/a.jpg", &blob).await.unwrap();
        let url = store.resolve_url(&key).await.unwrap();
        assert_eq!(url, "http://localhost:3000/o/paintings%2Fa.jpg?alt=media");
        assert_eq!(store.key_for_url(&url).as_deref(), Some("paintings/a.jpg"));
        assert_eq!(store.key_for_url("https://elsewhere.example/o/paintings%2Fa.jpg"), None);

        let fetched = store.download(&key).await.unwrap();
        assert_eq!(fetched.bytes, vec![1, 2, 3]);
        assert_eq!(fetched.content_type.as_deref(), Some("image/jpeg"));

        store.delete(&key).await.unwrap();
        assert!(matches!(
            store.resolve_url(&key).await,
            Err(BlobError::NotFound(_))
        ));
        assert!(matches!(store.delete(&key).await, Err(BlobError::NotFound(_))));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn rejects_oversized_and_escaping_keys() {
        let root = temp_root("limits");
        let store = FsBlobStore::new(&root, "http://localhost:3000", 2);
        let blob = Blob::new("big.png", None, vec![0; 3]);
        assert!(matches!(
            store.upload("projects/big.png", &blob).await,
            Err(BlobError::TooLarge { size: 3, limit: 2 })
        ));
        assert!(matches!(
            store.upload("../outside.png", &blob).await,
            Err(BlobError::InvalidKey(_))
        ));
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
