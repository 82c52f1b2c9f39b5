//! Collection descriptors for the content managed from the admin page.

use crate::storage::document::Fields;
use serde_json::Value as JsonValue;

pub mod collections;
pub mod registry;

pub use collections::{
    ArchivedExhibitionModel, PaintingModel, ProjectModel, UpcomingExhibitionModel, VideoModel,
};
pub use registry::ModelRegistry;

/// Where an uploaded file lands and which document field keeps its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSlot {
    /// Document field holding the resolved download URL.
    pub field: &'static str,
    /// Blob key namespace, e.g. `paintings` gives `paintings/<file name>`.
    pub key_prefix: &'static str,
    /// Accepted MIME family, e.g. `image/`.
    pub accept: &'static str,
}

/// Trait that defines the contract for any managed content collection.
///
/// This trait allows the collection mirror to work with any collection
/// without knowing its schema. Each descriptor provides:
/// - Collection name and a human label for messages
/// - Required and optional field paths (dotted for nested objects)
/// - Optional image slot, listing cap and singleton flag
/// - Optional extra validation
pub trait CollectionModel: Send + Sync {
    /// Name of the remote collection.
    fn collection_name(&self) -> &str;

    /// Singular label used in user-visible messages ("project").
    fn label(&self) -> &str;

    fn required_fields(&self) -> &[&'static str];

    fn optional_fields(&self) -> &[&'static str] {
        &[]
    }

    fn image_slot(&self) -> Option<ImageSlot> {
        None
    }

    /// Store-side cap applied to every listing.
    fn list_limit(&self) -> Option<u32> {
        None
    }

    /// Whether the collection holds at most one active document.
    fn is_singleton(&self) -> bool {
        false
    }

    /// Initial values of the empty form, on top of blank strings.
    fn defaults(&self) -> Fields {
        Fields::new()
    }

    /// Collection-specific checks run after the required-field check.
    fn validate_extra(&self, _fields: &Fields) -> Result<(), String> {
        Ok(())
    }

    /// Coerces validated form values into their stored types.
    fn normalize(&self, _fields: &mut Fields) {}

    /// Every schema path, required first.
    fn schema_fields(&self) -> Vec<&'static str> {
        self.required_fields()
            .iter()
            .chain(self.optional_fields())
            .copied()
            .collect()
    }

    /// The empty form shape: every non-image path set to "" plus `defaults()`.
    fn empty_draft(&self) -> Fields {
        let image_field = self.image_slot().map(|s| s.field);
        let mut fields = Fields::new();
        for path in self.schema_fields() {
            if Some(path) != image_field {
                set_path(&mut fields, path, JsonValue::String(String::new()));
            }
        }
        for (k, v) in self.defaults() {
            fields.insert(k, v);
        }
        fields
    }

    /// Validates a draft before any store call.
    ///
    /// A required image field counts as present when `image_satisfied`: a file
    /// accompanies the save, or an update keeps the stored URL.
    fn validate_payload(&self, fields: &Fields, image_satisfied: bool) -> Result<(), String> {
        let image_field = self.image_slot().map(|s| s.field);
        let missing: Vec<&str> = self
            .required_fields()
            .iter()
            .copied()
            .filter(|path| !(image_satisfied && Some(*path) == image_field))
            .filter(|path| get_path(fields, path).map_or(true, is_blank))
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing required field(s): {}", missing.join(", ")));
        }
        self.validate_extra(fields)
    }

    /// Copies only schema paths out of `fields`, dropping client-only keys
    /// such as `id` or a transient `imageFile`.
    fn sanitize(&self, fields: &Fields) -> Fields {
        let mut out = Fields::new();
        for path in self.schema_fields() {
            if let Some(v) = get_path(fields, path) {
                set_path(&mut out, path, v.clone());
            }
        }
        out
    }
}

/// Looks up a dotted path (`location.name`).
pub fn get_path<'a>(fields: &'a Fields, path: &str) -> Option<&'a JsonValue> {
    let mut parts = path.split('.');
    let mut current = fields.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Writes `value` at a dotted path, creating intermediate objects.
pub fn set_path(fields: &mut Fields, path: &str, value: JsonValue) {
    match path.split_once('.') {
        None => {
            fields.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = fields
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(Fields::new()));
            if !entry.is_object() {
                *entry = JsonValue::Object(Fields::new());
            }
            if let JsonValue::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

/// Null, blank strings and empty containers count as missing.
pub fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        JsonValue::Bool(_) | JsonValue::Number(_) => false,
    }
}
