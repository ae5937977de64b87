use anyhow::Result;
use itertools::Itertools;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::model::{
    App, AppFilter, Component, ComponentFilter, ComponentKind, ComponentType,
    ComponentTypeFilter, Id, Image, ImageFilter, Screen, ScreenFilter,
};
use crate::store::traits::{
    AppStore, ComponentStore, ComponentTypeStore, DuplicateKeyError, ImageStore, ScreenStore,
    Store,
};

/// In-memory store backing tests and local development. Mirrors the
/// PostgreSQL behavior including the unique constraints, which surface as
/// [`DuplicateKeyError`] the same way a violated index does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    apps: RwLock<HashMap<Id, App>>,
    screens: RwLock<HashMap<Id, Screen>>,
    components: RwLock<HashMap<Id, Component>>,
    component_types: RwLock<HashMap<Id, ComponentType>>,
    images: RwLock<HashMap<Id, Image>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait::async_trait]
impl AppStore for MemoryStore {
    async fn get_app(&self, id: &Id) -> Result<Option<App>> {
        Ok(self.apps.read().get(id).cloned())
    }

    async fn find_app_by_name(&self, name: &str) -> Result<Option<App>> {
        Ok(self.apps.read().values().find(|a| a.name == name).cloned())
    }

    async fn list_apps(&self, filter: &AppFilter) -> Result<Vec<App>> {
        let apps = self
            .apps
            .read()
            .values()
            .filter(|a| match &filter.search {
                Some(search) => contains_ci(&a.name, search),
                None => true,
            })
            .cloned()
            .sorted_by_key(|a| Reverse(a.created_at))
            .collect();
        Ok(apps)
    }

    async fn upsert_app(&self, app: App) -> Result<()> {
        let mut apps = self.apps.write();
        if apps.values().any(|a| a.name == app.name && a.id != app.id) {
            return Err(DuplicateKeyError { field: "name" }.into());
        }
        apps.insert(app.id.clone(), app);
        Ok(())
    }

    async fn delete_app(&self, id: &Id) -> Result<bool> {
        Ok(self.apps.write().remove(id).is_some())
    }
}

#[async_trait::async_trait]
impl ScreenStore for MemoryStore {
    async fn get_screen(&self, id: &Id) -> Result<Option<Screen>> {
        Ok(self.screens.read().get(id).cloned())
    }

    async fn list_screens(&self, filter: &ScreenFilter) -> Result<Vec<Screen>> {
        let screens = self
            .screens
            .read()
            .values()
            .filter(|s| {
                filter
                    .application_id
                    .as_ref()
                    .map_or(true, |id| &s.application_id == id)
                    && filter.status.map_or(true, |status| s.status == status)
            })
            .cloned()
            .sorted_by_key(|s| Reverse(s.created_at))
            .collect();
        Ok(screens)
    }

    async fn upsert_screen(&self, screen: Screen) -> Result<()> {
        self.screens.write().insert(screen.id.clone(), screen);
        Ok(())
    }

    async fn delete_screen(&self, id: &Id) -> Result<bool> {
        Ok(self.screens.write().remove(id).is_some())
    }
}

#[async_trait::async_trait]
impl ComponentStore for MemoryStore {
    async fn get_component(&self, id: &Id) -> Result<Option<Component>> {
        Ok(self.components.read().get(id).cloned())
    }

    async fn list_components(&self, filter: &ComponentFilter) -> Result<Vec<Component>> {
        let components = self
            .components
            .read()
            .values()
            .filter(|c| {
                filter
                    .screen_id
                    .as_ref()
                    .map_or(true, |id| &c.screen_id == id)
                    && filter
                        .application_id
                        .as_ref()
                        .map_or(true, |id| &c.application_id == id)
                    && filter.kind.map_or(true, |kind| c.kind == kind)
                    && filter
                        .parent_id
                        .as_ref()
                        .map_or(true, |id| c.parent_id.as_ref() == Some(id))
                    && filter.status.map_or(true, |status| c.status == status)
            })
            .cloned()
            .sorted_by_key(|c| (c.order, Reverse(c.created_at)))
            .collect();
        Ok(components)
    }

    async fn upsert_component(&self, component: Component) -> Result<()> {
        self.components
            .write()
            .insert(component.id.clone(), component);
        Ok(())
    }

    async fn delete_component(&self, id: &Id) -> Result<bool> {
        Ok(self.components.write().remove(id).is_some())
    }

    async fn delete_components_by_parent(&self, parent_id: &Id) -> Result<u64> {
        let mut components = self.components.write();
        let child_ids: Vec<Id> = components
            .values()
            .filter(|c| c.parent_id.as_ref() == Some(parent_id))
            .map(|c| c.id.clone())
            .collect();
        for id in &child_ids {
            components.remove(id);
        }
        Ok(child_ids.len() as u64)
    }
}

#[async_trait::async_trait]
impl ComponentTypeStore for MemoryStore {
    async fn get_component_type(&self, id: &Id) -> Result<Option<ComponentType>> {
        Ok(self.component_types.read().get(id).cloned())
    }

    async fn find_component_type_by_kind(
        &self,
        kind: ComponentKind,
    ) -> Result<Option<ComponentType>> {
        Ok(self
            .component_types
            .read()
            .values()
            .find(|t| t.kind == kind)
            .cloned())
    }

    async fn list_component_types(
        &self,
        filter: &ComponentTypeFilter,
    ) -> Result<Vec<ComponentType>> {
        let types = self
            .component_types
            .read()
            .values()
            .filter(|t| {
                filter
                    .category
                    .map_or(true, |category| t.category == category)
                    && filter.visible.map_or(true, |visible| t.visible == visible)
            })
            .cloned()
            .sorted_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)))
            .collect();
        Ok(types)
    }

    async fn upsert_component_type(&self, component_type: ComponentType) -> Result<()> {
        let mut types = self.component_types.write();
        if types
            .values()
            .any(|t| t.kind == component_type.kind && t.id != component_type.id)
        {
            return Err(DuplicateKeyError { field: "type" }.into());
        }
        types.insert(component_type.id.clone(), component_type);
        Ok(())
    }

    async fn delete_component_type(&self, id: &Id) -> Result<bool> {
        Ok(self.component_types.write().remove(id).is_some())
    }
}

#[async_trait::async_trait]
impl ImageStore for MemoryStore {
    async fn get_image(&self, id: &Id) -> Result<Option<Image>> {
        Ok(self.images.read().get(id).cloned())
    }

    async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<Image>> {
        let tags = filter.tag_list();
        let images = self
            .images
            .read()
            .values()
            .filter(|i| {
                filter
                    .category
                    .map_or(true, |category| i.category == category)
                    && filter.status.map_or(true, |status| i.status == status)
                    && filter.search.as_ref().map_or(true, |search| {
                        contains_ci(&i.name, search)
                            || contains_ci(&i.description, search)
                            || contains_ci(&i.alt, search)
                    })
                    && (tags.is_empty() || i.tags.iter().any(|t| tags.contains(t)))
            })
            .cloned()
            .sorted_by_key(|i| Reverse(i.created_at))
            .collect();
        Ok(images)
    }

    async fn find_images_by_ids(&self, ids: &[Id]) -> Result<Vec<Image>> {
        let images = self.images.read();
        Ok(ids.iter().filter_map(|id| images.get(id).cloned()).collect())
    }

    async fn upsert_image(&self, image: Image) -> Result<()> {
        let mut images = self.images.write();
        if images.values().any(|i| {
            i.cloudinary_public_id == image.cloudinary_public_id && i.id != image.id
        }) {
            return Err(DuplicateKeyError {
                field: "cloudinaryPublicId",
            }
            .into());
        }
        images.insert(image.id.clone(), image);
        Ok(())
    }

    async fn delete_image(&self, id: &Id) -> Result<bool> {
        Ok(self.images.write().remove(id).is_some())
    }

    async fn delete_images(&self, ids: &[Id]) -> Result<u64> {
        let mut images = self.images.write();
        let mut deleted = 0;
        for id in ids {
            if images.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewApp, NewComponent, Theme};
    use serde_json::json;

    fn sample_app(name: &str) -> App {
        NewApp {
            name: Some(name.to_string()),
            theme: None,
        }
        .into_app(name.to_string())
    }

    fn sample_component(id: &str, parent: Option<&str>) -> Component {
        let new: NewComponent = serde_json::from_value(json!({
            "screenId": "s1",
            "applicationId": "a1",
            "type": "container",
            "parentId": parent
        }))
        .unwrap();
        let mut component = new
            .assemble(
                "s1".into(),
                "a1".into(),
                ComponentKind::Container,
                None,
            )
            .unwrap();
        component.id = id.to_string();
        component
    }

    #[tokio::test]
    async fn duplicate_app_name_is_rejected() {
        let store = MemoryStore::new();
        store.upsert_app(sample_app("Shop")).await.unwrap();

        let err = store.upsert_app(sample_app("Shop")).await.unwrap_err();
        let dup = err.downcast_ref::<DuplicateKeyError>().unwrap();
        assert_eq!(dup.field, "name");
    }

    #[tokio::test]
    async fn renaming_an_app_to_its_own_name_is_allowed() {
        let store = MemoryStore::new();
        let mut app = sample_app("Shop");
        store.upsert_app(app.clone()).await.unwrap();

        app.theme = Theme::default();
        store.upsert_app(app).await.unwrap();
    }

    #[tokio::test]
    async fn parent_cascade_is_one_level_only() {
        let store = MemoryStore::new();
        store
            .upsert_component(sample_component("root", None))
            .await
            .unwrap();
        store
            .upsert_component(sample_component("child-a", Some("root")))
            .await
            .unwrap();
        store
            .upsert_component(sample_component("child-b", Some("root")))
            .await
            .unwrap();
        store
            .upsert_component(sample_component("grandchild", Some("child-a")))
            .await
            .unwrap();

        let removed = store
            .delete_components_by_parent(&"root".to_string())
            .await
            .unwrap();
        assert_eq!(removed, 2);

        // The grandchild survives with a dangling parent reference.
        let orphan = store
            .get_component(&"grandchild".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(orphan.parent_id.as_deref(), Some("child-a"));
        assert!(store
            .get_component(&"child-a".to_string())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn components_are_ordered_by_order_then_recency() {
        let store = MemoryStore::new();
        let mut first = sample_component("c1", None);
        first.order = 2;
        let mut second = sample_component("c2", None);
        second.order = 1;
        store.upsert_component(first).await.unwrap();
        store.upsert_component(second).await.unwrap();

        let listed = store
            .list_components(&ComponentFilter::for_screen("s1".into()))
            .await
            .unwrap();
        let ids: Vec<&str> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }
}
