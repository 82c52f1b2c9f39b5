use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::blob::Blob;
use crate::storage::document::Fields;

/// Lifecycle phase of one collection manager.
///
/// `Loading`, `Saving` and `Deleting` are in-flight phases; while one of them
/// is active every other load/save/delete request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    LoadFailed,
    Editing { id: Option<String> },
    Saving,
    SaveFailed,
    ConfirmingDelete { id: String },
    Deleting { id: String },
    DeleteFailed,
}

impl Phase {
    /// Name of the in-flight operation, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Phase::Loading => Some("load"),
            Phase::Saving => Some("save"),
            Phase::Deleting { .. } => Some("delete"),
            _ => None,
        }
    }
}

/// A save request: the form fields, the target id for an update, and an
/// optional file to upload first. The file never reaches the document store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub id: Option<String>,
    pub fields: Fields,
    pub upload: Option<Blob>,
}

impl Draft {
    pub fn create(fields: Fields) -> Self {
        Self {
            id: None,
            fields,
            upload: None,
        }
    }

    pub fn update(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: Some(id.into()),
            fields,
            upload: None,
        }
    }

    pub fn with_upload(mut self, blob: Blob) -> Self {
        self.upload = Some(blob);
        self
    }
}

/// The form state a manager keeps between requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FormDraft {
    pub id: Option<String>,
    #[schema(value_type = Object)]
    pub fields: Fields,
    /// File name of the upload that accompanied the last failed save.
    pub pending_upload: Option<String>,
}

impl From<&Draft> for FormDraft {
    fn from(draft: &Draft) -> Self {
        Self {
            id: draft.id.clone(),
            fields: draft.fields.clone(),
            pending_upload: draft.upload.as_ref().map(|b| b.file_name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phases_serialize_with_a_tag() {
        let v = serde_json::to_value(Phase::ConfirmingDelete { id: "abc".into() }).unwrap();
        assert_eq!(v, json!({"phase": "confirming_delete", "id": "abc"}));
        assert_eq!(serde_json::to_value(Phase::Loaded).unwrap(), json!({"phase": "loaded"}));
        assert_eq!(Phase::Deleting { id: "x".into() }.operation(), Some("delete"));
        assert_eq!(Phase::ConfirmingDelete { id: "x".into() }.operation(), None);
    }
}
