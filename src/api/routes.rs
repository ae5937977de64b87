use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::api::{component_handlers, image_handlers};
use crate::store::Store;

/// Builds the full route table. State is attached by the caller so tests can
/// run the same router over an in-memory store.
pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .route("/", get(handlers::root))
        // Apps
        .route(
            "/api/apps",
            post(handlers::create_app::<S>).get(handlers::list_apps::<S>),
        )
        .route(
            "/api/apps/:id",
            get(handlers::get_app::<S>)
                .put(handlers::update_app::<S>)
                .delete(handlers::delete_app::<S>),
        )
        // Screens
        .route(
            "/api/screens",
            post(handlers::create_screen::<S>).get(handlers::list_screens::<S>),
        )
        .route(
            "/api/screens/:id",
            get(handlers::get_screen::<S>)
                .put(handlers::update_screen::<S>)
                .delete(handlers::delete_screen::<S>),
        )
        .route(
            "/api/screens/:id/position",
            patch(handlers::update_screen_position::<S>),
        )
        // Components
        .route(
            "/api/components",
            post(component_handlers::create_component::<S>)
                .get(component_handlers::list_components::<S>),
        )
        .route(
            "/api/components/screen/:screen_id",
            get(component_handlers::components_by_screen::<S>),
        )
        .route(
            "/api/components/:id",
            get(component_handlers::get_component::<S>)
                .put(component_handlers::update_component::<S>)
                .delete(component_handlers::delete_component::<S>),
        )
        .route(
            "/api/components/:id/styles",
            patch(component_handlers::update_component_styles::<S>),
        )
        .route(
            "/api/components/:id/position",
            patch(component_handlers::update_component_position::<S>),
        )
        // Component type registry; `:key` is a kind string on GET and a
        // record id on PUT/DELETE
        .route(
            "/api/component-types",
            post(component_handlers::create_component_type::<S>)
                .get(component_handlers::list_component_types::<S>),
        )
        .route(
            "/api/component-types/initialize",
            post(component_handlers::initialize_component_types::<S>),
        )
        .route(
            "/api/component-types/:key",
            get(component_handlers::get_component_type_by_kind::<S>)
                .put(component_handlers::update_component_type::<S>)
                .delete(component_handlers::delete_component_type::<S>),
        )
        // Images
        .route(
            "/api/images/upload",
            post(image_handlers::upload_image::<S>)
                .layer(DefaultBodyLimit::max(image_handlers::UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/images",
            get(image_handlers::list_images::<S>),
        )
        .route(
            "/api/images/bulk",
            delete(image_handlers::bulk_delete_images::<S>),
        )
        .route(
            "/api/images/:id",
            get(image_handlers::get_image::<S>)
                .put(image_handlers::update_image::<S>)
                .delete(image_handlers::delete_image::<S>),
        )
        .fallback(handlers::route_not_found)
}
