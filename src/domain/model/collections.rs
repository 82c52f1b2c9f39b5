use super::{CollectionModel, ImageSlot};
use crate::storage::document::Fields;
use serde_json::{json, Value as JsonValue};

/// Listing cap shared by the project and archived-exhibition managers.
pub const MAX_LISTED: u32 = 10;

/// Implementation of CollectionModel for the splash video (singleton).
pub struct VideoModel;

impl CollectionModel for VideoModel {
    fn collection_name(&self) -> &str {
        "videos"
    }

    fn label(&self) -> &str {
        "video"
    }

    fn required_fields(&self) -> &[&'static str] {
        &["src", "playbackRate"]
    }

    fn image_slot(&self) -> Option<ImageSlot> {
        Some(ImageSlot {
            field: "src",
            key_prefix: "videos",
            accept: "video/",
        })
    }

    fn is_singleton(&self) -> bool {
        true
    }

    fn defaults(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("playbackRate".into(), json!(1.1));
        fields
    }

    fn validate_extra(&self, fields: &Fields) -> Result<(), String> {
        match fields.get("playbackRate").and_then(playback_rate) {
            Some(rate) if rate > 0.0 => Ok(()),
            _ => Err("playbackRate must be a positive number".to_string()),
        }
    }

    fn normalize(&self, fields: &mut Fields) {
        let rate = fields
            .get("playbackRate")
            .and_then(playback_rate)
            .and_then(serde_json::Number::from_f64);
        if let Some(rate) = rate {
            fields.insert("playbackRate".into(), JsonValue::Number(rate));
        }
    }
}

/// Form inputs submit numbers as strings; both spellings are accepted.
fn playback_rate(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        other => other.as_f64(),
    }
    .filter(|rate| rate.is_finite())
}

/// Implementation of CollectionModel for projects.
pub struct ProjectModel;

impl CollectionModel for ProjectModel {
    fn collection_name(&self) -> &str {
        "projects"
    }

    fn label(&self) -> &str {
        "project"
    }

    fn required_fields(&self) -> &[&'static str] {
        &["title", "description"]
    }

    fn optional_fields(&self) -> &[&'static str] {
        &["image", "caption", "link"]
    }

    fn image_slot(&self) -> Option<ImageSlot> {
        Some(ImageSlot {
            field: "image",
            key_prefix: "project-images",
            accept: "image/",
        })
    }

    fn list_limit(&self) -> Option<u32> {
        Some(MAX_LISTED)
    }
}

/// Implementation of CollectionModel for paintings.
pub struct PaintingModel;

impl CollectionModel for PaintingModel {
    fn collection_name(&self) -> &str {
        "paintings"
    }

    fn label(&self) -> &str {
        "painting"
    }

    fn required_fields(&self) -> &[&'static str] {
        &["caption", "measurements", "medium", "gallery"]
    }

    fn optional_fields(&self) -> &[&'static str] {
        &["src"]
    }

    fn image_slot(&self) -> Option<ImageSlot> {
        Some(ImageSlot {
            field: "src",
            key_prefix: "paintings",
            accept: "image/",
        })
    }
}

/// Implementation of CollectionModel for past exhibitions.
///
/// `type` is free text; the public site groups "Group", "Solo" and "Special".
pub struct ArchivedExhibitionModel;

impl CollectionModel for ArchivedExhibitionModel {
    fn collection_name(&self) -> &str {
        "exhibitions"
    }

    fn label(&self) -> &str {
        "exhibition"
    }

    fn required_fields(&self) -> &[&'static str] {
        &["title", "type"]
    }

    fn list_limit(&self) -> Option<u32> {
        Some(MAX_LISTED)
    }
}

/// Implementation of CollectionModel for upcoming exhibitions.
pub struct UpcomingExhibitionModel;

impl CollectionModel for UpcomingExhibitionModel {
    fn collection_name(&self) -> &str {
        "upcoming_exhibitions"
    }

    fn label(&self) -> &str {
        "upcoming exhibition"
    }

    fn required_fields(&self) -> &[&'static str] {
        &["title", "date", "quote", "location.name"]
    }

    fn optional_fields(&self) -> &[&'static str] {
        &["location.address", "location.city"]
    }
}
