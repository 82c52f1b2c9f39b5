//! InMemoryDocumentStore - insertion-ordered document store for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{new_document_id, DocumentStore, Fields, Record};
use crate::error::StoreError;

/// Operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Record>>,
    failures: HashMap<StoreOp, String>,
}

/// Document store backed by a `HashMap` of ordered vectors.
///
/// Clone-friendly via Arc; clones share the same data. Every call (including
/// failed ones) bumps a counter so tests can assert that no store traffic
/// happened.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of store calls issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes the next call of `op` fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, op: StoreOp, reason: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.insert(op, reason.to_string());
        }
    }

    /// Inserts a document directly, bypassing the call counter.
    pub fn seed(&self, collection: &str, fields: Fields) -> String {
        let id = new_document_id();
        if let Ok(mut inner) = self.inner.lock() {
            inner
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(Record::new(id.clone(), fields));
        }
        id
    }

    /// Reads a document directly, bypassing the call counter.
    pub fn get(&self, collection: &str, id: &str) -> Option<Record> {
        let inner = self.inner.lock().ok()?;
        inner
            .collections
            .get(collection)?
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.collections.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn enter(&self, op: StoreOp) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))?;
        if let Some(reason) = inner.failures.remove(&op) {
            return Err(StoreError::Unavailable(reason));
        }
        Ok(inner)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_all(
        &self,
        collection: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Record>, StoreError> {
        let inner = self.enter(StoreOp::List)?;
        let docs = inner.collections.get(collection).cloned().unwrap_or_default();
        Ok(match limit {
            Some(n) => docs.into_iter().take(n as usize).collect(),
            None => docs,
        })
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.enter(StoreOp::Create)?;
        let id = new_document_id();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Record::new(id.clone(), fields));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut inner = self.enter(StoreOp::Update)?;
        let record = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (k, v) in fields {
            record.fields.insert(k, v);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.enter(StoreOp::Delete)?;
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|r| r.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: serde_json::Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn update_merges_and_rejects_unknown_ids() {
        let store = InMemoryDocumentStore::new();
        let id = store
            .create("projects", fields(json!({"title": "A", "link": "x"})))
            .await
            .unwrap();

        store
            .update("projects", &id, fields(json!({"title": "B"})))
            .await
            .unwrap();
        let doc = store.get("projects", &id).unwrap();
        assert_eq!(doc.fields["title"], "B");
        assert_eq!(doc.fields["link"], "x");

        let err = store
            .update("projects", "missing", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryDocumentStore::new();
        store.fail_next(StoreOp::List, "offline");
        assert!(store.list_all("videos", None).await.is_err());
        assert!(store.list_all("videos", None).await.unwrap().is_empty());
    }
}
