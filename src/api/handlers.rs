use axum::{
    extract::{Path, Query, State},
    http::Uri,
    Json as RequestJson,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::api::envelope::{
    classify_storage_error, created, deleted, ensure_valid_id, success, success_list,
    updated, ApiError, ApiResult,
};
use crate::config::Environment;
use crate::media::MediaHost;
use crate::model::{
    merge, App, AppFilter, AppUpdate, NewApp, NewScreen, PositionPatch, Screen, ScreenFilter,
    ScreenUpdate, MAX_APP_NAME_LENGTH,
};
use crate::store::Store;

/// Shared handler state: the document store, the media host client and the
/// environment label surfaced by the health endpoint
pub struct AppState<S> {
    pub store: Arc<S>,
    pub media: Arc<dyn MediaHost>,
    pub media_folder: String,
    pub environment: Environment,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            media: Arc::clone(&self.media),
            media_folder: self.media_folder.clone(),
            environment: self.environment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub environment: &'static str,
    pub timestamp: String,
}

pub async fn health_check<S: Store>(State(state): State<AppState<S>>) -> ApiResult<HealthInfo> {
    Ok(success(
        HealthInfo {
            environment: state.environment.as_str(),
            timestamp: Utc::now().to_rfc3339(),
        },
        "Server is running",
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeInfo {
    pub version: &'static str,
    pub endpoints: &'static [&'static str],
}

pub async fn root() -> ApiResult<WelcomeInfo> {
    Ok(success(
        WelcomeInfo {
            version: env!("CARGO_PKG_VERSION"),
            endpoints: &[
                "/api/apps",
                "/api/screens",
                "/api/components",
                "/api/component-types",
                "/api/images",
            ],
        },
        "Welcome to the appcanvas API",
    ))
}

/// Error-enveloped 404 for unknown routes
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Not Found - {}", uri.path()))
}

fn validate_app_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("App name is required"));
    }
    if name.chars().count() > MAX_APP_NAME_LENGTH {
        return Err(ApiError::validation(
            "App name cannot exceed 100 characters",
        ));
    }
    Ok(name)
}

// ---------------------------------------------------------------------------
// Apps
// ---------------------------------------------------------------------------

pub async fn create_app<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(new_app): RequestJson<NewApp>,
) -> ApiResult<App> {
    let name = match &new_app.name {
        Some(name) => validate_app_name(name)?,
        None => return Err(ApiError::validation("App name is required")),
    };

    let existing = state
        .store
        .find_app_by_name(&name)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create app"))?;
    if existing.is_some() {
        return Err(ApiError::validation("App name already exists"));
    }

    let app = new_app.into_app(name);
    state
        .store
        .upsert_app(app.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create app"))?;

    Ok(created(app, "App created successfully"))
}

pub async fn list_apps<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<AppFilter>,
) -> ApiResult<Vec<App>> {
    let apps = state
        .store
        .list_apps(&filter)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch apps"))?;

    Ok(success_list(apps, "Success"))
}

pub async fn get_app<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<App> {
    ensure_valid_id(&id, "Invalid app ID")?;

    let app = state
        .store
        .get_app(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch app"))?
        .ok_or_else(|| ApiError::not_found("App not found"))?;

    Ok(success(app, "Success"))
}

pub async fn update_app<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(update): RequestJson<AppUpdate>,
) -> ApiResult<App> {
    ensure_valid_id(&id, "Invalid app ID")?;

    let mut app = state
        .store
        .get_app(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update app"))?
        .ok_or_else(|| ApiError::not_found("App not found"))?;

    if let Some(raw) = &update.name {
        let name = validate_app_name(raw)?;
        if name != app.name {
            let existing = state
                .store
                .find_app_by_name(&name)
                .await
                .map_err(|e| classify_storage_error(e, "Failed to update app"))?;
            if existing.is_some() {
                return Err(ApiError::validation("App name already exists"));
            }
            app.name = name;
        }
    }
    if let Some(theme) = update.theme {
        app.theme = theme;
    }
    app.updated_at = Utc::now();

    state
        .store
        .upsert_app(app.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update app"))?;

    Ok(updated(app, "App updated successfully"))
}

pub async fn delete_app<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    ensure_valid_id(&id, "Invalid app ID")?;

    let removed = state
        .store
        .delete_app(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete app"))?;
    if !removed {
        return Err(ApiError::not_found("App not found"));
    }

    Ok(deleted("App deleted successfully"))
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

pub async fn create_screen<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(new_screen): RequestJson<NewScreen>,
) -> ApiResult<Screen> {
    let application_id = new_screen
        .application_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Application ID is required"))?;

    let app = state
        .store
        .get_app(&application_id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create screen"))?;
    if app.is_none() {
        return Err(ApiError::not_found("App not found"));
    }

    let screen = new_screen.into_screen(application_id);
    state
        .store
        .upsert_screen(screen.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to create screen"))?;

    Ok(created(screen, "Screen created successfully"))
}

pub async fn list_screens<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ScreenFilter>,
) -> ApiResult<Vec<Screen>> {
    let screens = state
        .store
        .list_screens(&filter)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch screens"))?;

    Ok(success_list(screens, "Success"))
}

pub async fn get_screen<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Screen> {
    ensure_valid_id(&id, "Invalid screen ID")?;

    let screen = state
        .store
        .get_screen(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch screen"))?
        .ok_or_else(|| ApiError::not_found("Screen not found"))?;

    Ok(success(screen, "Success"))
}

pub async fn update_screen<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(update): RequestJson<ScreenUpdate>,
) -> ApiResult<Screen> {
    ensure_valid_id(&id, "Invalid screen ID")?;

    let mut screen = state
        .store
        .get_screen(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update screen"))?
        .ok_or_else(|| ApiError::not_found("Screen not found"))?;

    // data and position merge key-wise, the rest replaces when present
    if let Some(data) = &update.data {
        screen.data = merge(&screen.data, data);
    }
    if let Some(position) = &update.position {
        screen.position = position.apply_to(screen.position);
    }
    if let Some(hidden) = update.hidden {
        screen.hidden = hidden;
    }
    if let Some(components) = update.components {
        screen.components = components;
    }
    if let Some(status) = update.status {
        screen.status = status;
    }
    screen.updated_at = Utc::now();

    state
        .store
        .upsert_screen(screen.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update screen"))?;

    Ok(updated(screen, "Screen updated successfully"))
}

#[derive(Debug, serde::Deserialize)]
pub struct PositionBody {
    pub position: Option<PositionPatch>,
}

pub async fn update_screen_position<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(body): RequestJson<PositionBody>,
) -> ApiResult<Screen> {
    ensure_valid_id(&id, "Invalid screen ID")?;

    let patch = body
        .position
        .ok_or_else(|| ApiError::validation("Position object is required"))?;

    let mut screen = state
        .store
        .get_screen(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update screen position"))?
        .ok_or_else(|| ApiError::not_found("Screen not found"))?;

    screen.position = patch.apply_to(screen.position);
    screen.updated_at = Utc::now();

    state
        .store
        .upsert_screen(screen.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update screen position"))?;

    Ok(updated(screen, "Screen position updated successfully"))
}

pub async fn delete_screen<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    ensure_valid_id(&id, "Invalid screen ID")?;

    let removed = state
        .store
        .delete_screen(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete screen"))?;
    if !removed {
        return Err(ApiError::not_found("Screen not found"));
    }

    Ok(deleted("Screen deleted successfully"))
}
