//! Error taxonomy for the admin content layer.
//!
//! Store adapters report [`StoreError`] / [`BlobError`]; the collection mirror
//! converts them into [`ManagerError`] at its boundary, which is what callers
//! (and the HTTP transport) ever see.

use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::storage::document::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures reported by a [`BlobStore`](crate::storage::blob::BlobStore).
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob '{0}' not found")]
    NotFound(String),
    #[error("blob too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error("invalid blob key '{0}'")]
    InvalidKey(String),
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by a collection manager.
///
/// The `Display` text is the user-visible message the manager records.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A required field is missing; raised before any store call.
    #[error("{0}")]
    Validation(String),
    /// Listing the collection failed.
    #[error("Failed to fetch {collection}: {reason}")]
    Fetch { collection: String, reason: String },
    /// The blob upload failed; no document was written.
    #[error("Error uploading file: {0}")]
    Upload(String),
    /// The document create/update failed (after any upload succeeded).
    #[error("Failed to save {label}: {reason}")]
    Save { label: String, reason: String },
    /// The blob or the document could not be deleted; nothing was removed locally.
    #[error("Failed to delete {label}: {reason}")]
    Delete { label: String, reason: String },
    /// Another operation is in flight on the same manager.
    #[error("{collection} is busy ({operation} in progress)")]
    Busy {
        collection: String,
        operation: &'static str,
    },
    #[error("{0}")]
    InvalidState(String),
    #[error("{label} '{id}' not found")]
    NotFound { label: String, id: String },
}

impl ManagerError {
    /// Short machine-readable code for transport envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            ManagerError::Validation(_) => "VALIDATION",
            ManagerError::Fetch { .. } => "FETCH_FAILED",
            ManagerError::Upload(_) => "UPLOAD_FAILED",
            ManagerError::Save { .. } => "SAVE_FAILED",
            ManagerError::Delete { .. } => "DELETE_FAILED",
            ManagerError::Busy { .. } => "BUSY",
            ManagerError::InvalidState(_) => "INVALID_STATE",
            ManagerError::NotFound { .. } => "NOT_FOUND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        let err = ManagerError::Save {
            label: "painting".into(),
            reason: "document store unavailable: offline".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to save painting: document store unavailable: offline"
        );
        assert_eq!(err.code(), "SAVE_FAILED");

        let busy = ManagerError::Busy {
            collection: "projects".into(),
            operation: "save",
        };
        assert_eq!(busy.to_string(), "projects is busy (save in progress)");
    }
}
