use axum::{
    extract::{Path, Query, State},
    Json as RequestJson,
};
use chrono::Utc;
use serde::Serialize;

use crate::api::envelope::{
    classify_storage_error, created, deleted, ensure_valid_id, success, success_list, updated,
    ApiError, ApiResult,
};
use crate::api::handlers::{AppState, PositionBody};
use crate::model::{
    merge, Component, ComponentFilter, ComponentSummary, ComponentType, ComponentTypeFilter,
    ComponentTypeUpdate, ComponentUpdate, JsonMap, NewComponent, NewComponentType, Styles,
};
use crate::seed::{self, SeedOutcome};
use crate::store::Store;

/// A component as it leaves read endpoints: the stored document plus its
/// immediate parent and children resolved to display summaries. Write
/// endpoints return the plain component.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    #[serde(flatten)]
    pub component: Component,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ComponentSummary>,
    pub child_components: Vec<ComponentSummary>,
}

/// Resolves one level of the tree. Dangling references (an orphan's parent,
/// a stale child id) are silently skipped rather than failing the read.
async fn resolve_view<S: Store>(
    store: &S,
    component: Component,
    with_styles: bool,
    failure_context: &str,
) -> Result<ComponentView, ApiError> {
    let parent = match &component.parent_id {
        Some(parent_id) => store
            .get_component(parent_id)
            .await
            .map_err(|e| classify_storage_error(e, failure_context))?
            .map(|p| p.summary(with_styles)),
        None => None,
    };

    let mut child_components = Vec::with_capacity(component.children.len());
    for child_id in &component.children {
        if let Some(child) = store
            .get_component(child_id)
            .await
            .map_err(|e| classify_storage_error(e, failure_context))?
        {
            child_components.push(child.summary(with_styles));
        }
    }

    Ok(ComponentView {
        component,
        parent,
        child_components,
    })
}

async fn resolve_views<S: Store>(
    store: &S,
    components: Vec<Component>,
    failure_context: &str,
) -> Result<Vec<ComponentView>, ApiError> {
    let mut views = Vec::with_capacity(components.len());
    for component in components {
        views.push(resolve_view(store, component, false, failure_context).await?);
    }
    Ok(views)
}

fn validate_styles_overlay(overlay: &JsonMap) -> Result<(), ApiError> {
    let errors = Styles::validate_overlay(overlay);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_fields("Validation failed", errors))
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

pub async fn create_component<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(new_component): RequestJson<NewComponent>,
) -> ApiResult<Component> {
    let screen_id = new_component
        .screen_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Screen ID is required"))?;
    let application_id = new_component
        .application_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Application ID is required"))?;
    let kind = new_component
        .kind
        .ok_or_else(|| ApiError::validation("Component type is required"))?;

    if let Some(overlay) = &new_component.styles {
        validate_styles_overlay(overlay)?;
    }

    let screen = state
        .store
        .get_screen(&screen_id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create component"))?;
    if screen.is_none() {
        return Err(ApiError::not_found("Screen not found"));
    }

    if let Some(parent_id) = &new_component.parent_id {
        let parent = state
            .store
            .get_component(parent_id)
            .await
            .map_err(|e| classify_storage_error(e, "Failed to create component"))?;
        if parent.is_none() {
            return Err(ApiError::not_found("Parent component not found"));
        }
    }

    let template = state
        .store
        .find_component_type_by_kind(kind)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create component"))?;

    let component = new_component
        .assemble(screen_id, application_id, kind, template.as_ref())
        .map_err(|e| classify_storage_error(e.into(), "Failed to create component"))?;

    state
        .store
        .upsert_component(component.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create component"))?;

    Ok(created(component, "Component created successfully"))
}

pub async fn list_components<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ComponentFilter>,
) -> ApiResult<Vec<ComponentView>> {
    let components = state
        .store
        .list_components(&filter)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch components"))?;

    let views = resolve_views(state.store.as_ref(), components, "Failed to fetch components")
        .await?;
    Ok(success_list(views, "Success"))
}

pub async fn components_by_screen<S: Store>(
    State(state): State<AppState<S>>,
    Path(screen_id): Path<String>,
) -> ApiResult<Vec<ComponentView>> {
    ensure_valid_id(&screen_id, "Invalid ID format")?;

    let components = state
        .store
        .list_components(&ComponentFilter::for_screen(screen_id))
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch components"))?;

    let views = resolve_views(state.store.as_ref(), components, "Failed to fetch components")
        .await?;
    Ok(success_list(views, "Success"))
}

pub async fn get_component<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<ComponentView> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let component = state
        .store
        .get_component(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch component"))?
        .ok_or_else(|| ApiError::not_found("Component not found"))?;

    // Single-item reads resolve summaries with styles included
    let view = resolve_view(state.store.as_ref(), component, true, "Failed to fetch component")
        .await?;
    Ok(success(view, "Success"))
}

pub async fn update_component<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(update): RequestJson<ComponentUpdate>,
) -> ApiResult<Component> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let mut component = state
        .store
        .get_component(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component"))?
        .ok_or_else(|| ApiError::not_found("Component not found"))?;

    // parentId is tri-state: absent leaves it alone, null detaches
    match &update.parent_id {
        Some(Some(parent_id)) => {
            if component.parent_id.as_ref() != Some(parent_id) {
                let parent = state
                    .store
                    .get_component(parent_id)
                    .await
                    .map_err(|e| classify_storage_error(e, "Failed to update component"))?;
                if parent.is_none() {
                    return Err(ApiError::not_found("Parent component not found"));
                }
            }
            component.parent_id = Some(parent_id.clone());
        }
        Some(None) => component.parent_id = None,
        None => {}
    }

    if let Some(overlay) = &update.styles {
        validate_styles_overlay(overlay)?;
        component.styles = component
            .styles
            .merged_with(overlay)
            .map_err(|e| classify_storage_error(e.into(), "Failed to update component"))?;
    }
    if let Some(data) = &update.data {
        component.data = merge(&component.data, data);
    }
    if let Some(position) = &update.position {
        component.position = position.apply_to(component.position);
    }
    if let Some(properties) = update.properties {
        component.properties = properties;
    }
    if let Some(kind) = update.kind {
        component.kind = kind;
    }
    if let Some(children) = update.children {
        component.children = children;
    }
    if let Some(order) = update.order {
        component.order = order;
    }
    if let Some(hidden) = update.hidden {
        component.hidden = hidden;
    }
    if let Some(status) = update.status {
        component.status = status;
    }
    if let Some(application_id) = update.application_id {
        component.application_id = application_id;
    }
    component.updated_at = Utc::now();

    state
        .store
        .upsert_component(component.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component"))?;

    Ok(updated(component, "Component updated successfully"))
}

#[derive(Debug, serde::Deserialize)]
pub struct StylesBody {
    pub styles: Option<serde_json::Value>,
}

pub async fn update_component_styles<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(body): RequestJson<StylesBody>,
) -> ApiResult<Component> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let overlay = match body.styles {
        Some(serde_json::Value::Object(map)) => map,
        _ => return Err(ApiError::validation("Styles object is required")),
    };
    validate_styles_overlay(&overlay)?;

    let mut component = state
        .store
        .get_component(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component styles"))?
        .ok_or_else(|| ApiError::not_found("Component not found"))?;

    component.styles = component
        .styles
        .merged_with(&overlay)
        .map_err(|e| classify_storage_error(e.into(), "Failed to update component styles"))?;
    component.updated_at = Utc::now();

    state
        .store
        .upsert_component(component.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component styles"))?;

    Ok(updated(component, "Component styles updated successfully"))
}

pub async fn update_component_position<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(body): RequestJson<PositionBody>,
) -> ApiResult<Component> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let patch = body
        .position
        .ok_or_else(|| ApiError::validation("Position with x and y coordinates is required"))?;

    let mut component = state
        .store
        .get_component(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component position"))?
        .ok_or_else(|| ApiError::not_found("Component not found"))?;

    component.position = patch.apply_to(component.position);
    component.updated_at = Utc::now();

    state
        .store
        .upsert_component(component.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component position"))?;

    Ok(updated(component, "Component position updated successfully"))
}

pub async fn delete_component<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let component = state
        .store
        .get_component(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete component"))?;
    if component.is_none() {
        return Err(ApiError::not_found("Component not found"));
    }

    // One level of cascade only; grandchildren keep their (now dangling)
    // parent reference and surface as orphans
    let removed_children = state
        .store
        .delete_components_by_parent(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete component"))?;
    if removed_children > 0 {
        log::info!("removed {} child component(s) of {}", removed_children, id);
    }

    state
        .store
        .delete_component(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete component"))?;

    Ok(deleted("Component deleted successfully"))
}

// ---------------------------------------------------------------------------
// Component types
// ---------------------------------------------------------------------------

pub async fn create_component_type<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(new_type): RequestJson<NewComponentType>,
) -> ApiResult<ComponentType> {
    let kind = new_type
        .kind
        .ok_or_else(|| ApiError::validation("Component type is required"))?;
    let name = new_type
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation("Component name is required"))?;

    let existing = state
        .store
        .find_component_type_by_kind(kind)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create component type"))?;
    if existing.is_some() {
        return Err(ApiError::validation("Component type already exists"));
    }

    let component_type = new_type.into_component_type(kind, name);
    state
        .store
        .upsert_component_type(component_type.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create component type"))?;

    Ok(created(component_type, "Component type created successfully"))
}

pub async fn list_component_types<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ComponentTypeFilter>,
) -> ApiResult<Vec<ComponentType>> {
    let component_types = state
        .store
        .list_component_types(&filter)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch component types"))?;

    Ok(success_list(component_types, "Success"))
}

/// Looks a registry entry up by its kind string, e.g. `/api/component-types/button`
pub async fn get_component_type_by_kind<S: Store>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
) -> ApiResult<ComponentType> {
    let kind = kind
        .parse()
        .map_err(|_| ApiError::not_found("Component type not found"))?;

    let component_type = state
        .store
        .find_component_type_by_kind(kind)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch component type"))?
        .ok_or_else(|| ApiError::not_found("Component type not found"))?;

    Ok(success(component_type, "Success"))
}

pub async fn update_component_type<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(update): RequestJson<ComponentTypeUpdate>,
) -> ApiResult<ComponentType> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let mut component_type = state
        .store
        .get_component_type(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component type"))?
        .ok_or_else(|| ApiError::not_found("Component type not found"))?;

    if let Some(name) = update.name {
        component_type.name = name;
    }
    if let Some(category) = update.category {
        component_type.category = category;
    }
    if let Some(icon) = update.icon {
        component_type.icon = icon;
    }
    if let Some(description) = update.description {
        component_type.description = description;
    }
    if let Some(default_styles) = update.default_styles {
        component_type.default_styles = default_styles;
    }
    if let Some(default_properties) = update.default_properties {
        component_type.default_properties = default_properties;
    }
    if let Some(default_data) = update.default_data {
        component_type.default_data = default_data;
    }
    if let Some(visible) = update.visible {
        component_type.visible = visible;
    }
    if let Some(order) = update.order {
        component_type.order = order;
    }
    component_type.updated_at = Utc::now();

    state
        .store
        .upsert_component_type(component_type.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update component type"))?;

    Ok(updated(component_type, "Component type updated successfully"))
}

pub async fn delete_component_type<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let removed = state
        .store
        .delete_component_type(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete component type"))?;
    if !removed {
        return Err(ApiError::not_found("Component type not found"));
    }

    Ok(deleted("Component type deleted successfully"))
}

/// Idempotent bootstrap of the built-in palette
pub async fn initialize_component_types<S: Store>(
    State(state): State<AppState<S>>,
) -> ApiResult<SeedOutcome> {
    let outcome = seed::initialize_component_types(state.store.as_ref())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to initialize component types"))?;

    Ok(success(outcome, "Success"))
}
