//! Collection manager behaviour against the in-memory stores: validation
//! before any store call, local patching after confirmed writes, the
//! two-step delete, and the per-manager in-flight lock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portfolio_admin::domain::upload::Uploader;
use portfolio_admin::storage::blob::{download_url, BlobOp};
use portfolio_admin::storage::document::{Fields, StoreOp};
use portfolio_admin::{
    Blob, BlobError, BlobStore, CollectionMirror, DocumentStore, Draft, InMemoryBlobStore,
    InMemoryDocumentStore, ManagerError, ModelRegistry, Phase, Record, StoreError,
};
use serde_json::{json, Value as JsonValue};
use tokio::sync::Semaphore;

const BASE: &str = "http://localhost:3000";

fn fields(v: JsonValue) -> Fields {
    v.as_object().cloned().expect("object literal")
}

struct Harness {
    docs: InMemoryDocumentStore,
    blobs: InMemoryBlobStore,
    registry: ModelRegistry,
}

impl Harness {
    fn new() -> Self {
        Self {
            docs: InMemoryDocumentStore::new(),
            blobs: InMemoryBlobStore::new(BASE, 1024 * 1024),
            registry: ModelRegistry::portfolio(),
        }
    }

    fn mirror(&self, collection: &str) -> CollectionMirror {
        self.mirror_over(collection, Arc::new(self.docs.clone()))
    }

    fn mirror_over(&self, collection: &str, docs: Arc<dyn DocumentStore>) -> CollectionMirror {
        let model = self.registry.get(collection).expect("registered collection");
        CollectionMirror::new(model, docs, Uploader::new(Arc::new(self.blobs.clone())))
    }

    fn calls(&self) -> usize {
        self.docs.calls() + self.blobs.calls()
    }
}

fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

fn painting(caption: &str) -> Fields {
    fields(json!({
        "caption": caption,
        "measurements": "40 x 50 cm",
        "medium": "oil on linen",
        "gallery": "studio"
    }))
}

#[tokio::test]
async fn missing_required_fields_never_reach_the_store() {
    let h = Harness::new();
    for collection in h.registry.list_models() {
        let mirror = h.mirror(&collection);
        let err = mirror.save(Draft::create(Fields::new())).await.unwrap_err();
        assert!(
            matches!(err, ManagerError::Validation(ref m) if m.starts_with("Missing required field(s)")),
            "{}: {:?}",
            collection,
            err
        );
        assert!(matches!(mirror.phase().unwrap(), Phase::Editing { id: None }));
    }
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn blank_archived_title_is_rejected_locally() {
    let h = Harness::new();
    let mirror = h.mirror("exhibitions");
    let err = mirror
        .save(Draft::create(fields(json!({"title": "", "type": "Group"}))))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing required field(s): title");
    assert_eq!(h.calls(), 0);

    let snapshot = mirror.snapshot().unwrap();
    assert_eq!(snapshot.draft.fields["type"], json!("Group"));
    assert_eq!(snapshot.message.as_deref(), Some("Missing required field(s): title"));
}

#[tokio::test]
async fn create_appends_the_store_assigned_id() {
    let h = Harness::new();
    h.docs.seed("projects", fields(json!({"title": "Old", "description": "d"})));
    let mirror = h.mirror("projects");
    mirror.load().await.unwrap();
    let before = mirror.records().unwrap().len();

    let record = mirror
        .save(Draft::create(fields(json!({
            "title": "Murals",
            "description": "Public work",
            "link": "https://example.org"
        }))))
        .await
        .unwrap();

    let records = mirror.records().unwrap();
    assert_eq!(records.len(), before + 1);
    assert_eq!(records.last().unwrap().id, record.id);
    let stored = h.docs.get("projects", &record.id).expect("document created");
    assert_eq!(stored.fields["title"], json!("Murals"));
    assert_eq!(mirror.phase().unwrap(), Phase::Loaded);
    assert_eq!(
        mirror.snapshot().unwrap().message.as_deref(),
        Some("Project added successfully!")
    );
}

#[tokio::test]
async fn update_patches_the_record_in_place() {
    let h = Harness::new();
    let image = download_url(BASE, "project-images/b.png").unwrap();
    let a = h.docs.seed("projects", fields(json!({"title": "A", "description": "a"})));
    let b = h.docs.seed(
        "projects",
        fields(json!({"title": "B", "description": "b", "image": image})),
    );
    let c = h.docs.seed("projects", fields(json!({"title": "C", "description": "c"})));
    let mirror = h.mirror("projects");
    mirror.load().await.unwrap();

    let form = mirror.begin_edit(&b).unwrap();
    assert_eq!(form.fields["title"], json!("B"));
    assert!(matches!(mirror.phase().unwrap(), Phase::Editing { id: Some(ref id) } if id == &b));

    // The image field rides along in the form but is not rewritten without a new file.
    let mut edited = form.fields.clone();
    edited.insert("title".into(), json!("B2"));
    edited.insert("image".into(), json!(""));
    mirror.save(Draft::update(b.clone(), edited)).await.unwrap();

    let records = mirror.records().unwrap();
    assert_eq!(ids(&records), vec![a, b.clone(), c]);
    assert_eq!(records[1].fields["title"], json!("B2"));
    assert_eq!(records[1].fields["image"], json!(image));
    let stored = h.docs.get("projects", &b).unwrap();
    assert_eq!(stored.fields["title"], json!("B2"));
    assert_eq!(stored.fields["image"], json!(image));
}

#[tokio::test]
async fn update_of_unlisted_id_is_not_found() {
    let h = Harness::new();
    let mirror = h.mirror("exhibitions");
    mirror.load().await.unwrap();
    let calls = h.calls();
    let err = mirror
        .save(Draft::update("nope", fields(json!({"title": "T", "type": "Solo"}))))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::NotFound { .. }));
    assert_eq!(h.calls(), calls);
}

#[tokio::test]
async fn painting_upload_lands_under_its_prefix() {
    let h = Harness::new();
    let mirror = h.mirror("paintings");
    mirror.load().await.unwrap();

    let draft = Draft::create(painting("Dusk")).with_upload(Blob::new("a.jpg", None, vec![1, 2, 3]));
    let record = mirror.save(draft).await.unwrap();

    assert!(h.blobs.contains("paintings/a.jpg"));
    let url = h.blobs.resolve_url("paintings/a.jpg").await.unwrap();
    assert_eq!(record.str_field("src"), Some(url.as_str()));
    assert_eq!(h.docs.get("paintings", &record.id).unwrap().fields["src"], json!(url));
    assert!(!record.fields.contains_key("imageFile"));
}

#[tokio::test]
async fn remove_frees_the_file_then_the_document() {
    let h = Harness::new();
    let mirror = h.mirror("paintings");
    mirror.load().await.unwrap();
    let record = mirror
        .save(Draft::create(painting("Dawn")).with_upload(Blob::new("b.png", None, vec![9])))
        .await
        .unwrap();

    mirror.request_remove(&record.id).unwrap();
    assert_eq!(
        mirror.phase().unwrap(),
        Phase::ConfirmingDelete { id: record.id.clone() }
    );
    assert_eq!(
        mirror.snapshot().unwrap().message.as_deref(),
        Some("Are you sure you want to delete this painting?")
    );

    let removed = mirror.confirm_remove(true).await.unwrap();
    assert_eq!(removed.map(|r| r.id), Some(record.id.clone()));
    assert!(mirror.records().unwrap().iter().all(|r| r.id != record.id));
    assert!(h.docs.get("paintings", &record.id).is_none());
    assert!(matches!(
        h.blobs.resolve_url("paintings/b.png").await,
        Err(BlobError::NotFound(_))
    ));
    assert_eq!(
        mirror.snapshot().unwrap().message.as_deref(),
        Some("Painting deleted successfully!")
    );
}

#[tokio::test]
async fn declined_confirmation_deletes_nothing() {
    let h = Harness::new();
    let id = h.docs.seed("exhibitions", fields(json!({"title": "T", "type": "Solo"})));
    let mirror = h.mirror("exhibitions");
    mirror.load().await.unwrap();

    mirror.request_remove(&id).unwrap();
    let calls = h.calls();
    assert_eq!(mirror.confirm_remove(false).await.unwrap(), None);
    assert_eq!(h.calls(), calls);
    assert_eq!(mirror.phase().unwrap(), Phase::Loaded);
    assert_eq!(ids(&mirror.records().unwrap()), vec![id.clone()]);
    assert!(h.docs.get("exhibitions", &id).is_some());
}

#[tokio::test]
async fn confirm_without_request_is_invalid() {
    let h = Harness::new();
    let mirror = h.mirror("exhibitions");
    let err = mirror.confirm_remove(true).await.unwrap_err();
    assert!(matches!(err, ManagerError::InvalidState(_)));
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn file_delete_failure_keeps_record_and_document() {
    let h = Harness::new();
    let mirror = h.mirror("paintings");
    mirror.load().await.unwrap();
    let record = mirror
        .save(Draft::create(painting("Noon")).with_upload(Blob::new("c.jpg", None, vec![7])))
        .await
        .unwrap();

    mirror.request_remove(&record.id).unwrap();
    h.blobs.fail_next(BlobOp::Delete, "permission denied");
    let err = mirror.confirm_remove(true).await.unwrap_err();

    assert!(matches!(err, ManagerError::Delete { .. }));
    assert_eq!(mirror.phase().unwrap(), Phase::DeleteFailed);
    assert!(mirror.records().unwrap().iter().any(|r| r.id == record.id));
    assert!(h.docs.get("paintings", &record.id).is_some());
    assert!(h.blobs.contains("paintings/c.jpg"));

    // A retry goes through once the store recovers.
    mirror.request_remove(&record.id).unwrap();
    mirror.confirm_remove(true).await.unwrap();
    assert!(h.docs.get("paintings", &record.id).is_none());
}

#[tokio::test]
async fn already_missing_file_does_not_block_removal() {
    let h = Harness::new();
    let id = h.docs.seed(
        "paintings",
        fields(json!({
            "caption": "Lost",
            "measurements": "1",
            "medium": "ink",
            "gallery": "g",
            "src": download_url(BASE, "paintings/gone.jpg").unwrap()
        })),
    );
    let mirror = h.mirror("paintings");
    mirror.load().await.unwrap();
    mirror.request_remove(&id).unwrap();
    mirror.confirm_remove(true).await.unwrap();
    assert!(h.docs.get("paintings", &id).is_none());
}

#[tokio::test]
async fn removing_a_record_with_an_external_link_keeps_other_files() {
    let h = Harness::new();
    let mirror = h.mirror("projects");
    mirror.load().await.unwrap();

    let owner = mirror
        .save(
            Draft::create(fields(json!({"title": "A", "description": "uploaded"})))
                .with_upload(Blob::new("a.jpg", None, vec![1, 2])),
        )
        .await
        .unwrap();
    // Same key, different host: a link to someone else's copy.
    let linker = mirror
        .save(Draft::create(fields(json!({
            "title": "B",
            "description": "linked",
            "image": "https://cdn.example.com/o/project-images%2Fa.jpg?alt=media"
        }))))
        .await
        .unwrap();

    mirror.request_remove(&linker.id).unwrap();
    mirror.confirm_remove(true).await.unwrap();

    assert!(h.docs.get("projects", &linker.id).is_none());
    assert!(h.blobs.contains("project-images/a.jpg"));
    let url = h.blobs.resolve_url("project-images/a.jpg").await.unwrap();
    assert_eq!(owner.str_field("image"), Some(url.as_str()));
    assert_eq!(ids(&mirror.records().unwrap()), vec![owner.id]);
}

#[tokio::test]
async fn playback_rate_from_a_form_is_stored_as_a_number() {
    let h = Harness::new();
    let mirror = h.mirror("videos");
    mirror.load().await.unwrap();
    let record = mirror
        .save(
            Draft::create(fields(json!({"playbackRate": "1.5"})))
                .with_upload(Blob::new("clip.mp4", None, vec![0; 4])),
        )
        .await
        .unwrap();

    let stored = h.docs.get("videos", &record.id).unwrap();
    assert!(stored.fields["playbackRate"].is_number());
    assert_eq!(stored.fields["playbackRate"], json!(1.5));
    assert_eq!(record.fields["playbackRate"], json!(1.5));
}

#[tokio::test]
async fn video_rate_can_change_without_a_new_file() {
    let h = Harness::new();
    let mirror = h.mirror("videos");
    mirror.load().await.unwrap();
    let video = mirror
        .save(
            Draft::create(fields(json!({"playbackRate": 1.1})))
                .with_upload(Blob::new("clip.mp4", None, vec![0; 4])),
        )
        .await
        .unwrap();
    let src = video.str_field("src").unwrap().to_string();

    mirror
        .save(Draft::update(video.id.clone(), fields(json!({"playbackRate": "0.8"}))))
        .await
        .unwrap();

    let stored = h.docs.get("videos", &video.id).unwrap();
    assert_eq!(stored.fields["playbackRate"], json!(0.8));
    assert_eq!(stored.fields["src"], json!(src));
    let active = mirror.active().unwrap().unwrap();
    assert_eq!(active.fields["playbackRate"], json!(0.8));
    assert_eq!(active.str_field("src"), Some(src.as_str()));
}

#[tokio::test]
async fn upload_failure_creates_no_document() {
    let h = Harness::new();
    let mirror = h.mirror("paintings");
    mirror.load().await.unwrap();
    h.blobs.fail_next(BlobOp::Upload, "network down");

    let err = mirror
        .save(Draft::create(painting("Rain")).with_upload(Blob::new("d.jpg", None, vec![1])))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Error uploading file: blob store unavailable: network down");
    assert_eq!(h.docs.count("paintings"), 0);
    assert!(mirror.records().unwrap().is_empty());
    let snapshot = mirror.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::SaveFailed);
    assert_eq!(snapshot.draft.fields["caption"], json!("Rain"));
    assert_eq!(snapshot.draft.pending_upload.as_deref(), Some("d.jpg"));
}

#[tokio::test]
async fn document_write_failure_leaves_local_state_alone() {
    let h = Harness::new();
    let mirror = h.mirror("exhibitions");
    mirror.load().await.unwrap();
    h.docs.fail_next(StoreOp::Create, "quota exceeded");
    let err = mirror
        .save(Draft::create(fields(json!({"title": "T", "type": "Group"}))))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Save { .. }));
    assert!(mirror.records().unwrap().is_empty());
    assert_eq!(mirror.phase().unwrap(), Phase::SaveFailed);
}

#[tokio::test]
async fn load_twice_yields_the_same_ids() {
    let h = Harness::new();
    for i in 0..3 {
        h.docs.seed("paintings", painting(&format!("p{}", i)));
    }
    let mirror = h.mirror("paintings");
    assert_eq!(mirror.load().await.unwrap(), 3);
    let first = ids(&mirror.records().unwrap());
    mirror.load().await.unwrap();
    assert_eq!(ids(&mirror.records().unwrap()), first);
}

#[tokio::test]
async fn archived_listing_is_capped_at_ten() {
    let h = Harness::new();
    for i in 0..15 {
        h.docs.seed(
            "exhibitions",
            fields(json!({"title": format!("show {}", i), "type": "Group"})),
        );
    }
    let mirror = h.mirror("exhibitions");
    assert_eq!(mirror.load().await.unwrap(), 10);
    assert_eq!(mirror.records().unwrap().len(), 10);
}

#[tokio::test]
async fn failed_load_keeps_stale_records() {
    let h = Harness::new();
    h.docs.seed("paintings", painting("one"));
    h.docs.seed("paintings", painting("two"));
    let mirror = h.mirror("paintings");
    mirror.load().await.unwrap();

    h.docs.fail_next(StoreOp::List, "offline");
    let err = mirror.load().await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to fetch paintings"));
    assert_eq!(mirror.records().unwrap().len(), 2);
    assert_eq!(mirror.phase().unwrap(), Phase::LoadFailed);
}

#[tokio::test]
async fn upcoming_exhibition_with_nested_location_is_appended() {
    let h = Harness::new();
    let mirror = h.mirror("upcoming_exhibitions");
    mirror.load().await.unwrap();
    let record = mirror
        .save(Draft::create(fields(json!({
            "title": "Echo",
            "date": "2025",
            "quote": "x",
            "location": {"name": "Hall"}
        }))))
        .await
        .unwrap();
    let records = mirror.records().unwrap();
    assert_eq!(records.last().map(|r| r.id.clone()), Some(record.id.clone()));
    assert_eq!(
        h.docs.get("upcoming_exhibitions", &record.id).unwrap().fields["location"]["name"],
        json!("Hall")
    );
}

#[tokio::test]
async fn video_is_a_singleton() {
    let h = Harness::new();
    let mirror = h.mirror("videos");
    mirror.load().await.unwrap();
    mirror
        .save(
            Draft::create(fields(json!({"playbackRate": 1.1})))
                .with_upload(Blob::new("clip.mp4", None, vec![0; 8])),
        )
        .await
        .unwrap();
    let active = mirror.active().unwrap().expect("active video");
    assert_eq!(active.str_field("src"), Some(download_url(BASE, "videos/clip.mp4").unwrap().as_str()));

    let calls = h.calls();
    let err = mirror
        .save(
            Draft::create(fields(json!({"playbackRate": 1.0})))
                .with_upload(Blob::new("other.mp4", None, vec![0; 8])),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Validation(ref m) if m.contains("already exists")));
    assert_eq!(h.calls(), calls);
    assert_eq!(h.docs.count("videos"), 1);
}

/// Document store whose listing waits for a permit, so a load can be held in flight.
struct GatedStore {
    inner: InMemoryDocumentStore,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn list_all(&self, collection: &str, limit: Option<u32>) -> Result<Vec<Record>, StoreError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        permit.forget();
        self.inner.list_all(collection, limit).await
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.inner.create(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }
}

#[tokio::test]
async fn second_operation_while_loading_is_busy() {
    let h = Harness::new();
    let id = h.docs.seed("exhibitions", fields(json!({"title": "T", "type": "Solo"})));
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(GatedStore {
        inner: h.docs.clone(),
        gate: gate.clone(),
    });
    let mirror = Arc::new(h.mirror_over("exhibitions", store));

    let loading = {
        let mirror = mirror.clone();
        tokio::spawn(async move { mirror.load().await })
    };
    while mirror.phase().unwrap() != Phase::Loading {
        tokio::task::yield_now().await;
    }

    let err = mirror
        .save(Draft::create(fields(json!({"title": "New", "type": "Group"}))))
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Busy { operation: "load", .. }));
    assert!(matches!(mirror.load().await, Err(ManagerError::Busy { .. })));
    assert!(matches!(mirror.request_remove(&id), Err(ManagerError::Busy { .. })));
    assert_eq!(h.docs.count("exhibitions"), 1);

    gate.add_permits(1);
    assert_eq!(loading.await.unwrap().unwrap(), 1);
    assert_eq!(mirror.phase().unwrap(), Phase::Loaded);
}

#[tokio::test]
async fn abandoned_load_restores_the_previous_phase() {
    let h = Harness::new();
    let gate = Arc::new(Semaphore::new(1));
    let store = Arc::new(GatedStore {
        inner: h.docs.clone(),
        gate: gate.clone(),
    });
    let mirror = h.mirror_over("paintings", store);
    mirror.load().await.unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(50), mirror.load()).await;
    assert!(timed_out.is_err());
    assert_eq!(mirror.phase().unwrap(), Phase::Loaded);

    gate.add_permits(1);
    mirror.load().await.unwrap();
}
