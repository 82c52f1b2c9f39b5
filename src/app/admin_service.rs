//! The admin page: one collection manager per registered collection.
//!
//! Managers are independent. Mounting loads all of them concurrently and a
//! failing manager only affects its own section of the page.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use utoipa::ToSchema;

use crate::domain::mirror::{CollectionMirror, MirrorSnapshot};
use crate::domain::model::ModelRegistry;
use crate::domain::upload::Uploader;
use crate::error::ManagerError;
use crate::storage::blob::BlobStore;
use crate::storage::document::DocumentStore;

/// Outcome of loading one manager at mount time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MountReport {
    pub collection: String,
    pub loaded: Option<usize>,
    pub error: Option<String>,
}

pub struct AdminService {
    registry: Arc<ModelRegistry>,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    managers: Vec<Arc<CollectionMirror>>,
}

impl AdminService {
    /// Builds one manager per collection in `registry`, in registry order.
    pub fn new(
        registry: Arc<ModelRegistry>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let uploader = Uploader::new(blobs.clone());
        let managers = registry
            .iter()
            .map(|model| {
                Arc::new(CollectionMirror::new(
                    model,
                    documents.clone(),
                    uploader.clone(),
                ))
            })
            .collect();
        Self {
            registry,
            documents,
            blobs,
            managers,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn managers(&self) -> &[Arc<CollectionMirror>] {
        &self.managers
    }

    pub fn manager(&self, collection: &str) -> Option<Arc<CollectionMirror>> {
        self.managers
            .iter()
            .find(|m| m.collection() == collection)
            .cloned()
    }

    /// Loads every manager once. Failures are reported, not propagated.
    pub async fn mount(&self) -> Vec<MountReport> {
        let mut tasks = JoinSet::new();
        for (idx, manager) in self.managers.iter().enumerate() {
            let manager = manager.clone();
            tasks.spawn(async move { (idx, manager.load().await) });
        }

        let mut reports: Vec<Option<MountReport>> = vec![None; self.managers.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    let collection = self.managers[idx].collection().to_string();
                    reports[idx] = Some(match result {
                        Ok(n) => MountReport {
                            collection,
                            loaded: Some(n),
                            error: None,
                        },
                        Err(e) => MountReport {
                            collection,
                            loaded: None,
                            error: Some(e.to_string()),
                        },
                    });
                }
                Err(e) => tracing::error!(error = %e, "manager load task failed"),
            }
        }

        reports
            .into_iter()
            .enumerate()
            .map(|(idx, report)| {
                report.unwrap_or_else(|| MountReport {
                    collection: self.managers[idx].collection().to_string(),
                    loaded: None,
                    error: Some("load task did not complete".to_string()),
                })
            })
            .collect()
    }

    pub fn snapshots(&self) -> Result<Vec<MirrorSnapshot>, ManagerError> {
        self.managers.iter().map(|m| m.snapshot()).collect()
    }
}
