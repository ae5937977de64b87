pub mod api;
pub mod config;
pub mod media;
pub mod model;
pub mod seed;
pub mod store;

pub use api::{create_router, AppState};
pub use model::*;
pub use store::{MemoryStore, PostgresStore, Store};

use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Builds the CORS layer from configuration: an empty origin list means any
/// origin is accepted (the development default)
pub fn cors_layer(config: &config::CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    if config.allowed_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Boots the server against PostgreSQL and the configured media host.
/// Configuration is read from the environment (APPCANVAS_* variables plus
/// DATABASE_URL); also used by integration setups that want the real stack.
pub async fn run_server() -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    dotenvy::dotenv().ok();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = config::AppConfig::load()?;

    let database_url = config.database_url()?;
    let postgres_store =
        PostgresStore::new(&database_url, config.database.max_connections.unwrap_or(10)).await?;
    postgres_store.migrate().await?;

    let state = AppState {
        store: Arc::new(postgres_store),
        media: Arc::new(media::CloudinaryClient::new(&config.media)),
        media_folder: config.media.folder.clone(),
        environment: config.environment,
    };

    let app = create_router()
        .with_state(state)
        .layer(cors_layer(&config.cors));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
