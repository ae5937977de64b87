use crate::model::{
    App, AppFilter, Component, ComponentFilter, ComponentKind, ComponentType,
    ComponentTypeFilter, Id, Image, ImageFilter, Screen, ScreenFilter,
};
use anyhow::Result;

/// Raised by a store when a unique constraint is violated; the envelope
/// layer turns it into a `<field> already exists` validation error
#[derive(Debug, thiserror::Error)]
#[error("{field} already exists")]
pub struct DuplicateKeyError {
    pub field: &'static str,
}

#[async_trait::async_trait]
pub trait AppStore: Send + Sync {
    async fn get_app(&self, id: &Id) -> Result<Option<App>>;
    /// Exact match on the trimmed name; backs the uniqueness pre-check
    async fn find_app_by_name(&self, name: &str) -> Result<Option<App>>;
    /// Newest first
    async fn list_apps(&self, filter: &AppFilter) -> Result<Vec<App>>;
    async fn upsert_app(&self, app: App) -> Result<()>;
    async fn delete_app(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait ScreenStore: Send + Sync {
    async fn get_screen(&self, id: &Id) -> Result<Option<Screen>>;
    /// Newest first
    async fn list_screens(&self, filter: &ScreenFilter) -> Result<Vec<Screen>>;
    async fn upsert_screen(&self, screen: Screen) -> Result<()>;
    async fn delete_screen(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait ComponentStore: Send + Sync {
    async fn get_component(&self, id: &Id) -> Result<Option<Component>>;
    /// Ordered by `order` ascending, then newest first
    async fn list_components(&self, filter: &ComponentFilter) -> Result<Vec<Component>>;
    async fn upsert_component(&self, component: Component) -> Result<()>;
    async fn delete_component(&self, id: &Id) -> Result<bool>;
    /// One-level cascade helper: removes every component whose parent is
    /// `parent_id` and returns the count. Grandchildren are not touched.
    async fn delete_components_by_parent(&self, parent_id: &Id) -> Result<u64>;
}

#[async_trait::async_trait]
pub trait ComponentTypeStore: Send + Sync {
    async fn get_component_type(&self, id: &Id) -> Result<Option<ComponentType>>;
    async fn find_component_type_by_kind(
        &self,
        kind: ComponentKind,
    ) -> Result<Option<ComponentType>>;
    /// Ordered by `order` ascending, then name
    async fn list_component_types(
        &self,
        filter: &ComponentTypeFilter,
    ) -> Result<Vec<ComponentType>>;
    async fn upsert_component_type(&self, component_type: ComponentType) -> Result<()>;
    async fn delete_component_type(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    async fn get_image(&self, id: &Id) -> Result<Option<Image>>;
    /// Newest first
    async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<Image>>;
    async fn find_images_by_ids(&self, ids: &[Id]) -> Result<Vec<Image>>;
    async fn upsert_image(&self, image: Image) -> Result<()>;
    async fn delete_image(&self, id: &Id) -> Result<bool>;
    async fn delete_images(&self, ids: &[Id]) -> Result<u64>;
}

pub trait Store:
    AppStore + ScreenStore + ComponentStore + ComponentTypeStore + ImageStore + Send + Sync
{
}
