use crate::app::admin_service::AdminService;
use crate::app::public_site::PublicSite;
use crate::storage::blob::Blob;
use crate::storage::document::Fields;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<AdminService>,
    pub public: PublicSite,
}

impl AppState {
    pub fn new(admin: Arc<AdminService>) -> Self {
        let public = PublicSite::new(admin.registry().clone(), admin.documents().clone());
        Self { admin, public }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST {admin}/{collection}/save`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct SaveRequest {
    /// Present for an update, absent for a create.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub fields: Fields,
    /// File for the collection's image slot, uploaded before the document write.
    #[serde(default)]
    pub image: Option<UploadPayload>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UploadPayload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// File contents, standard base64.
    pub data_base64: String,
}

impl UploadPayload {
    pub fn into_blob(self) -> Result<Blob, String> {
        let bytes = STANDARD
            .decode(self.data_base64.trim())
            .map_err(|e| format!("image.data_base64 is not valid base64: {}", e))?;
        Ok(Blob::new(self.file_name, self.content_type.as_deref(), bytes))
    }
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct ConfirmRequest {
    pub confirm: bool,
}
