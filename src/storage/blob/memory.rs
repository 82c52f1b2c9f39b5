//! InMemoryBlobStore - HashMap-backed blob store for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{download_url, key_for_url, validate_key, Blob, BlobStore};
use crate::error::BlobError;

/// Blob operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Upload,
    Delete,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, Blob>,
    failures: HashMap<BlobOp, String>,
}

#[derive(Clone)]
pub struct InMemoryBlobStore {
    base_url: String,
    max_bytes: usize,
    inner: Arc<Mutex<Inner>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            base_url: base_url.into(),
            max_bytes,
            inner: Arc::new(Mutex::new(Inner::default())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, op: BlobOp, reason: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.insert(op, reason.to_string());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.objects.contains_key(key))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, BlobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .lock()
            .map_err(|_| BlobError::Unavailable("lock poisoned".into()))
    }

    fn take_failure(inner: &mut Inner, op: BlobOp) -> Result<(), BlobError> {
        match inner.failures.remove(&op) {
            Some(reason) => Err(BlobError::Unavailable(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, key: &str, blob: &Blob) -> Result<String, BlobError> {
        validate_key(key)?;
        let mut inner = self.lock()?;
        Self::take_failure(&mut inner, BlobOp::Upload)?;
        if blob.bytes.len() > self.max_bytes {
            return Err(BlobError::TooLarge {
                size: blob.bytes.len(),
                limit: self.max_bytes,
            });
        }
        inner.objects.insert(key.to_string(), blob.clone());
        Ok(key.to_string())
    }

    async fn resolve_url(&self, retrieval_key: &str) -> Result<String, BlobError> {
        let inner = self.lock()?;
        if !inner.objects.contains_key(retrieval_key) {
            return Err(BlobError::NotFound(retrieval_key.to_string()));
        }
        download_url(&self.base_url, retrieval_key)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let mut inner = self.lock()?;
        Self::take_failure(&mut inner, BlobOp::Delete)?;
        inner
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn download(&self, key: &str) -> Result<Blob, BlobError> {
        let inner = self.lock()?;
        inner
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        key_for_url(&self.base_url, url)
    }
}
