//! Document store abstraction: named collections of untyped JSON documents
//! with store-assigned identifiers.

use crate::error::StoreError;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryDocumentStore, StoreOp};
pub use postgres::PostgresDocumentStore;

/// Untyped key/value body of a document.
pub type Fields = serde_json::Map<String, JsonValue>;

/// One document of a collection, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// String value of a top-level field, if present.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// Contract every document backend fulfils.
///
/// `update` is a shallow merge of `fields` into the stored document and fails
/// with [`StoreError::NotFound`] for an unknown id. `delete` of an unknown id
/// succeeds. Listing order is whatever the backend returns.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_all(
        &self,
        collection: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Record>, StoreError>;

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Generates a 20-character alphanumeric document id.
pub(crate) fn new_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}
