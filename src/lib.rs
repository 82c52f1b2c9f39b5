pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::admin_service::{AdminService, MountReport};
pub use app::public_site::{ExhibitionGroups, PublicSite};
pub use domain::mirror::{CollectionMirror, Draft, FormDraft, MirrorSnapshot, Phase};
pub use domain::model::{CollectionModel, ImageSlot, ModelRegistry};
pub use error::{BlobError, ManagerError, StoreError};
pub use storage::blob::{Blob, BlobStore, FsBlobStore, InMemoryBlobStore};
pub use storage::document::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, Record};
