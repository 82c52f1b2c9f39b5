//! The collection mirror: a local, ordered copy of one remote collection that
//! is patched after every confirmed mutation instead of being re-fetched.
//!
//! One instance backs each admin manager. Operations on an instance are
//! serialized through its [`Phase`]; instances never share state.

mod state;

pub use state::{Draft, FormDraft, Phase};

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::model::CollectionModel;
use crate::domain::upload::Uploader;
use crate::error::{BlobError, ManagerError};
use crate::storage::document::{DocumentStore, Record};

struct MirrorInner {
    phase: Phase,
    records: Vec<Record>,
    form: FormDraft,
    message: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl MirrorInner {
    /// Phase to fall back to once nothing is pending.
    fn settled(&self) -> Phase {
        if self.loaded_at.is_some() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }
}

/// Serializable view of a manager for the admin page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MirrorSnapshot {
    pub collection: String,
    pub label: String,
    pub phase: Phase,
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Record>,
    pub draft: FormDraft,
    pub message: Option<String>,
    #[schema(value_type = Option<String>)]
    pub loaded_at: Option<DateTime<Utc>>,
}

pub struct CollectionMirror {
    model: Arc<dyn CollectionModel>,
    documents: Arc<dyn DocumentStore>,
    uploader: Uploader,
    inner: Mutex<MirrorInner>,
}

/// Marks an operation as in flight. If the owning future is dropped before
/// [`InFlight::finish`], the previous phase is restored.
struct InFlight<'a> {
    mirror: &'a CollectionMirror,
    fallback: Option<Phase>,
}

impl InFlight<'_> {
    fn finish<T>(mut self, apply: impl FnOnce(&mut MirrorInner) -> T) -> Result<T, ManagerError> {
        self.fallback = None;
        let mut inner = self.mirror.lock()?;
        Ok(apply(&mut inner))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.fallback.take() {
            if let Ok(mut inner) = self.mirror.inner.lock() {
                inner.phase = previous;
            }
        }
    }
}

impl CollectionMirror {
    pub fn new(
        model: Arc<dyn CollectionModel>,
        documents: Arc<dyn DocumentStore>,
        uploader: Uploader,
    ) -> Self {
        let form = FormDraft {
            fields: model.empty_draft(),
            ..FormDraft::default()
        };
        Self {
            model,
            documents,
            uploader,
            inner: Mutex::new(MirrorInner {
                phase: Phase::Idle,
                records: Vec::new(),
                form,
                message: None,
                loaded_at: None,
            }),
        }
    }

    pub fn model(&self) -> &Arc<dyn CollectionModel> {
        &self.model
    }

    pub fn collection(&self) -> &str {
        self.model.collection_name()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MirrorInner>, ManagerError> {
        self.inner
            .lock()
            .map_err(|_| ManagerError::InvalidState("manager state lock poisoned".to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&MirrorInner) -> T) -> Result<T, ManagerError> {
        let inner = self.lock()?;
        Ok(f(&inner))
    }

    /// Enters the in-flight phase computed by `next`, unless an operation is
    /// already running.
    fn begin(
        &self,
        next: impl FnOnce(&MirrorInner) -> Result<Phase, ManagerError>,
    ) -> Result<InFlight<'_>, ManagerError> {
        let mut inner = self.lock()?;
        if let Some(operation) = inner.phase.operation() {
            return Err(ManagerError::Busy {
                collection: self.collection().to_string(),
                operation,
            });
        }
        let phase = next(&inner)?;
        let previous = std::mem::replace(&mut inner.phase, phase);
        Ok(InFlight {
            mirror: self,
            fallback: Some(previous),
        })
    }

    fn busy_check(&self, inner: &MirrorInner) -> Result<(), ManagerError> {
        match inner.phase.operation() {
            Some(operation) => Err(ManagerError::Busy {
                collection: self.collection().to_string(),
                operation,
            }),
            None => Ok(()),
        }
    }

    fn not_found(&self, id: &str) -> ManagerError {
        ManagerError::NotFound {
            label: self.model.label().to_string(),
            id: id.to_string(),
        }
    }

    pub fn snapshot(&self) -> Result<MirrorSnapshot, ManagerError> {
        self.read(|inner| MirrorSnapshot {
            collection: self.collection().to_string(),
            label: self.model.label().to_string(),
            phase: inner.phase.clone(),
            records: inner.records.clone(),
            draft: inner.form.clone(),
            message: inner.message.clone(),
            loaded_at: inner.loaded_at,
        })
    }

    pub fn records(&self) -> Result<Vec<Record>, ManagerError> {
        self.read(|inner| inner.records.clone())
    }

    pub fn phase(&self) -> Result<Phase, ManagerError> {
        self.read(|inner| inner.phase.clone())
    }

    /// The first record; for the singleton video this is the active one.
    pub fn active(&self) -> Result<Option<Record>, ManagerError> {
        self.read(|inner| inner.records.first().cloned())
    }

    /// Replaces local state with the remote listing. On failure the previous
    /// records stay in place.
    pub async fn load(&self) -> Result<usize, ManagerError> {
        let flight = self.begin(|_| Ok(Phase::Loading))?;
        let collection = self.collection();

        match self
            .documents
            .list_all(collection, self.model.list_limit())
            .await
        {
            Ok(records) => {
                let count = records.len();
                flight.finish(|inner| {
                    inner.records = records;
                    inner.phase = Phase::Loaded;
                    inner.message = None;
                    inner.loaded_at = Some(Utc::now());
                })?;
                info!(collection, count, "collection loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(collection, error = %e, "collection load failed");
                let err = ManagerError::Fetch {
                    collection: collection.to_string(),
                    reason: e.to_string(),
                };
                let message = err.to_string();
                flight.finish(|inner| {
                    inner.phase = Phase::LoadFailed;
                    inner.message = Some(message);
                })?;
                Err(err)
            }
        }
    }

    /// Copies a record into the form for editing.
    pub fn begin_edit(&self, id: &str) -> Result<FormDraft, ManagerError> {
        let mut inner = self.lock()?;
        self.busy_check(&inner)?;
        let record = inner
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| self.not_found(id))?;

        let mut fields = self.model.empty_draft();
        for (k, v) in self.model.sanitize(&record.fields) {
            fields.insert(k, v);
        }
        inner.form = FormDraft {
            id: Some(record.id),
            fields,
            pending_upload: None,
        };
        inner.phase = Phase::Editing {
            id: Some(id.to_string()),
        };
        inner.message = None;
        Ok(inner.form.clone())
    }

    /// Resets the form to its empty shape.
    pub fn cancel_edit(&self) -> Result<(), ManagerError> {
        let mut inner = self.lock()?;
        self.busy_check(&inner)?;
        inner.form = FormDraft {
            fields: self.model.empty_draft(),
            ..FormDraft::default()
        };
        inner.phase = inner.settled();
        Ok(())
    }

    /// Creates (no id) or updates (id set) a record.
    ///
    /// Validation runs before any store call. A file, if present, is uploaded
    /// before the document write. Local state changes only after the store
    /// confirms; on failure the draft stays in the form.
    pub async fn save(&self, draft: Draft) -> Result<Record, ManagerError> {
        let flight = self.begin(|inner| match &inner.phase {
            Phase::ConfirmingDelete { .. } => Err(ManagerError::InvalidState(
                "a deletion is awaiting confirmation".to_string(),
            )),
            _ => Ok(Phase::Saving),
        })?;

        if let Err(err) = self.check_draft(&draft) {
            let message = err.to_string();
            let form = FormDraft::from(&draft);
            flight.finish(|inner| {
                inner.phase = Phase::Editing {
                    id: draft.id.clone(),
                };
                inner.form = form;
                inner.message = Some(message);
            })?;
            return Err(err);
        }

        match self.write(&draft).await {
            Ok(record) => {
                let label = capitalize(self.model.label());
                let message = match draft.id {
                    Some(_) => format!("{} updated successfully!", label),
                    None => format!("{} added successfully!", label),
                };
                let empty = self.model.empty_draft();
                let saved = record.clone();
                flight.finish(|inner| {
                    match inner.records.iter_mut().find(|r| r.id == saved.id) {
                        Some(slot) => *slot = saved,
                        None => inner.records.push(saved),
                    }
                    inner.form = FormDraft {
                        fields: empty,
                        ..FormDraft::default()
                    };
                    inner.phase = Phase::Loaded;
                    inner.message = Some(message);
                })?;
                info!(collection = self.collection(), id = %record.id, "record saved");
                Ok(record)
            }
            Err(err) => {
                warn!(collection = self.collection(), error = %err, "save failed");
                let message = err.to_string();
                let form = FormDraft::from(&draft);
                flight.finish(|inner| {
                    inner.phase = Phase::SaveFailed;
                    inner.form = form;
                    inner.message = Some(message);
                })?;
                Err(err)
            }
        }
    }

    /// Local checks: required fields, singleton rule, update target exists.
    fn check_draft(&self, draft: &Draft) -> Result<(), ManagerError> {
        self.model
            .validate_payload(&draft.fields, draft.upload.is_some() || draft.id.is_some())
            .map_err(ManagerError::Validation)?;

        let (count, known) = self.read(|inner| {
            let known = draft
                .id
                .as_deref()
                .map(|id| inner.records.iter().any(|r| r.id == id));
            (inner.records.len(), known)
        })?;

        match (&draft.id, known) {
            (None, _) if self.model.is_singleton() && count > 0 => {
                Err(ManagerError::Validation(format!(
                    "A {} already exists; update or delete the current {} first",
                    self.model.label(),
                    self.model.label()
                )))
            }
            (Some(id), Some(false)) => Err(self.not_found(id)),
            _ => Ok(()),
        }
    }

    /// Upload, then create or update the document. Returns the record as it
    /// should appear locally.
    async fn write(&self, draft: &Draft) -> Result<Record, ManagerError> {
        let collection = self.collection();
        let slot = self.model.image_slot();
        let mut payload = self.model.sanitize(&draft.fields);
        self.model.normalize(&mut payload);

        let uploaded = match (slot, &draft.upload) {
            (Some(slot), Some(blob)) => Some(self.uploader.upload(&slot, blob).await?),
            (None, Some(_)) => {
                return Err(ManagerError::Upload(format!(
                    "{} records do not take files",
                    self.model.label()
                )))
            }
            _ => None,
        };

        let save_err = |reason: String| ManagerError::Save {
            label: self.model.label().to_string(),
            reason,
        };

        match &draft.id {
            None => {
                if let (Some(slot), Some(url)) = (slot, &uploaded) {
                    payload.insert(slot.field.to_string(), url.clone().into());
                }
                let id = self
                    .documents
                    .create(collection, payload.clone())
                    .await
                    .map_err(|e| save_err(e.to_string()))?;
                Ok(Record::new(id, payload))
            }
            Some(id) => {
                if let Some(slot) = slot {
                    match &uploaded {
                        Some(url) => {
                            payload.insert(slot.field.to_string(), url.clone().into());
                        }
                        None => {
                            payload.remove(slot.field);
                        }
                    }
                }
                self.documents
                    .update(collection, id, payload.clone())
                    .await
                    .map_err(|e| save_err(e.to_string()))?;

                let existing = self
                    .read(|inner| inner.records.iter().find(|r| &r.id == id).cloned())?
                    .ok_or_else(|| self.not_found(id))?;
                let mut fields = existing.fields;
                for (k, v) in payload {
                    fields.insert(k, v);
                }
                Ok(Record::new(id.clone(), fields))
            }
        }
    }

    /// First step of a removal: asks for confirmation. Nothing is deleted yet.
    pub fn request_remove(&self, id: &str) -> Result<(), ManagerError> {
        let mut inner = self.lock()?;
        self.busy_check(&inner)?;
        if !inner.records.iter().any(|r| r.id == id) {
            return Err(self.not_found(id));
        }
        inner.phase = Phase::ConfirmingDelete { id: id.to_string() };
        inner.message = Some(format!(
            "Are you sure you want to delete this {}?",
            self.model.label()
        ));
        Ok(())
    }

    /// Second step of a removal. Declining returns to `Loaded` without any
    /// store call. Confirming deletes the file first, then the document; a
    /// failure at either step leaves the local record in place.
    pub async fn confirm_remove(&self, confirm: bool) -> Result<Option<Record>, ManagerError> {
        if !confirm {
            let mut inner = self.lock()?;
            if !matches!(inner.phase, Phase::ConfirmingDelete { .. }) {
                return Err(ManagerError::InvalidState(
                    "no deletion is awaiting confirmation".to_string(),
                ));
            }
            inner.phase = inner.settled();
            inner.message = None;
            return Ok(None);
        }

        let flight = self.begin(|inner| match &inner.phase {
            Phase::ConfirmingDelete { id } => Ok(Phase::Deleting { id: id.clone() }),
            _ => Err(ManagerError::InvalidState(
                "no deletion is awaiting confirmation".to_string(),
            )),
        })?;

        let target = self.read(|inner| match &inner.phase {
            Phase::Deleting { id } => inner.records.iter().find(|r| &r.id == id).cloned(),
            _ => None,
        })?;
        let record = match target {
            Some(record) => record,
            None => {
                flight.finish(|inner| inner.phase = inner.settled())?;
                return Err(ManagerError::InvalidState(
                    "the record to delete is no longer listed".to_string(),
                ));
            }
        };

        match self.delete_remote(&record).await {
            Ok(()) => {
                let message = format!("{} deleted successfully!", capitalize(self.model.label()));
                flight.finish(|inner| {
                    inner.records.retain(|r| r.id != record.id);
                    if inner.form.id.as_deref() == Some(record.id.as_str()) {
                        inner.form = FormDraft {
                            fields: self.model.empty_draft(),
                            ..FormDraft::default()
                        };
                    }
                    inner.phase = Phase::Loaded;
                    inner.message = Some(message);
                })?;
                info!(collection = self.collection(), id = %record.id, "record deleted");
                Ok(Some(record))
            }
            Err(err) => {
                warn!(collection = self.collection(), id = %record.id, error = %err, "delete failed");
                let message = err.to_string();
                flight.finish(|inner| {
                    inner.phase = Phase::DeleteFailed;
                    inner.message = Some(message);
                })?;
                Err(err)
            }
        }
    }

    async fn delete_remote(&self, record: &Record) -> Result<(), ManagerError> {
        let delete_err = |reason: String| ManagerError::Delete {
            label: self.model.label().to_string(),
            reason,
        };

        // Only files this store issued are freed; a linked external URL is left alone.
        let blobs = self.uploader.blobs();
        let blob_key = self
            .model
            .image_slot()
            .and_then(|slot| record.str_field(slot.field))
            .and_then(|url| blobs.key_for_url(url));
        if let Some(key) = blob_key {
            match blobs.delete(&key).await {
                Ok(()) => {}
                Err(BlobError::NotFound(_)) => {
                    warn!(collection = self.collection(), key = %key, "file already gone");
                }
                Err(e) => return Err(delete_err(e.to_string())),
            }
        }

        self.documents
            .delete(self.collection(), &record.id)
            .await
            .map_err(|e| delete_err(e.to_string()))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
