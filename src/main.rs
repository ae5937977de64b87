use appcanvas::api::{create_router, AppState};
use appcanvas::config::AppConfig;
use appcanvas::media::CloudinaryClient;
use appcanvas::store::PostgresStore;
use appcanvas::{cors_layer, seed};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Default to Info, keep sqlx quiet below Warn
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "configuration loaded: server={}:{} environment={}",
        config.server.host,
        config.server.port,
        config.environment.as_str()
    );

    log::info!("connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let postgres_store =
        PostgresStore::new(&database_url, config.database.max_connections.unwrap_or(10)).await?;

    log::info!("running database migrations...");
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);

    // Optional palette bootstrap at startup, same as POST /api/component-types/initialize
    if std::env::var("SEED_COMPONENT_TYPES").unwrap_or_default() == "true" {
        let outcome = seed::initialize_component_types(&*store).await?;
        log::info!("{}", outcome.message);
    }

    let state = AppState {
        store,
        media: Arc::new(CloudinaryClient::new(&config.media)),
        media_folder: config.media.folder.clone(),
        environment: config.environment,
    };

    let app = create_router()
        .with_state(state)
        .layer(cors_layer(&config.cors));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("appcanvas server running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
