//! Read-only queries behind the public pages (splash, projects, studio work,
//! exhibitions). They read the document store directly and never touch the
//! admin managers' local state.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::model::ModelRegistry;
use crate::error::ManagerError;
use crate::storage::document::{DocumentStore, Record};

/// Archived exhibitions split by their free-text `type`.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ExhibitionGroups {
    #[schema(value_type = Vec<Object>)]
    pub group: Vec<Record>,
    #[schema(value_type = Vec<Object>)]
    pub solo: Vec<Record>,
    #[schema(value_type = Vec<Object>)]
    pub special: Vec<Record>,
    #[schema(value_type = Vec<Object>)]
    pub other: Vec<Record>,
}

impl ExhibitionGroups {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut groups = Self::default();
        for record in records {
            let bucket = match record.str_field("type").map(str::trim) {
                Some("Group") => &mut groups.group,
                Some("Solo") => &mut groups.solo,
                Some("Special") => &mut groups.special,
                _ => &mut groups.other,
            };
            bucket.push(record);
        }
        groups
    }
}

#[derive(Clone)]
pub struct PublicSite {
    registry: Arc<ModelRegistry>,
    documents: Arc<dyn DocumentStore>,
}

impl PublicSite {
    pub fn new(registry: Arc<ModelRegistry>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            registry,
            documents,
        }
    }

    /// Lists a registered collection with its configured cap.
    pub async fn list(&self, collection: &str) -> Result<Vec<Record>, ManagerError> {
        let model = self
            .registry
            .get(collection)
            .ok_or_else(|| ManagerError::NotFound {
                label: "collection".to_string(),
                id: collection.to_string(),
            })?;
        self.fetch(collection, model.list_limit()).await
    }

    /// The first video document, if any.
    pub async fn active_video(&self) -> Result<Option<Record>, ManagerError> {
        Ok(self.fetch("videos", Some(1)).await?.into_iter().next())
    }

    pub async fn grouped_exhibitions(&self) -> Result<ExhibitionGroups, ManagerError> {
        Ok(ExhibitionGroups::from_records(self.list("exhibitions").await?))
    }

    /// The exhibition teased on the home page.
    pub async fn featured_upcoming(&self) -> Result<Option<Record>, ManagerError> {
        Ok(self
            .fetch("upcoming_exhibitions", Some(1))
            .await?
            .into_iter()
            .next())
    }

    async fn fetch(&self, collection: &str, limit: Option<u32>) -> Result<Vec<Record>, ManagerError> {
        self.documents
            .list_all(collection, limit)
            .await
            .map_err(|e| ManagerError::Fetch {
                collection: collection.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exhibition(id: &str, kind: &str) -> Record {
        Record::new(id, json!({"title": id, "type": kind}).as_object().cloned().unwrap())
    }

    #[test]
    fn groups_by_type() {
        let groups = ExhibitionGroups::from_records(vec![
            exhibition("a", "Group"),
            exhibition("b", "Solo"),
            exhibition("c", "Special"),
            exhibition("d", "Residency"),
            exhibition("e", "Solo "),
        ]);
        assert_eq!(groups.group.len(), 1);
        assert_eq!(
            groups.solo.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["b", "e"]
        );
        assert_eq!(groups.special.len(), 1);
        assert_eq!(groups.other[0].id, "d");
    }
}
