//! ModelRegistry for mapping collection names to CollectionModel implementations.

use crate::domain::model::{
    ArchivedExhibitionModel, CollectionModel, PaintingModel, ProjectModel,
    UpcomingExhibitionModel, VideoModel,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A registry that maps collection names to their descriptors, remembering
/// registration order (the order the admin page shows its managers in).
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn CollectionModel>>,
    order: Vec<String>,
}

impl ModelRegistry {
    /// Creates a new empty ModelRegistry.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The five portfolio collections, in admin-page order.
    pub fn portfolio() -> Self {
        let mut reg = Self::new();
        reg.register(VideoModel);
        reg.register(ProjectModel);
        reg.register(PaintingModel);
        reg.register(ArchivedExhibitionModel);
        reg.register(UpcomingExhibitionModel);
        reg
    }

    /// Registers a descriptor under its collection name. Re-registering a
    /// name replaces the descriptor but keeps its position.
    pub fn register<M: CollectionModel + 'static>(&mut self, model: M) {
        let name = model.collection_name().to_string();
        if !self.models.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.models.insert(name, Arc::new(model));
    }

    /// Retrieves a descriptor by collection name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CollectionModel>> {
        self.models.get(name).cloned()
    }

    /// Returns all registered collection names in registration order.
    pub fn list_models(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = Arc<dyn CollectionModel>> + '_ {
        self.order.iter().filter_map(|name| self.models.get(name).cloned())
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
