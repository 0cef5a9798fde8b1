//! services/api/src/bin/api.rs

use campus_api::{
    adapters::{DemoAuthProvider, InMemorySnapshotStore, JsonFileSnapshotStore, SqliteSnapshotStore},
    config::{Config, StorageBackend},
    error::ApiError,
    service::StoreService,
    web::{self, state::AppState},
};
use campus_core::{
    directory::CampusDirectory,
    ports::{Clock, SnapshotRepository},
    providers::{SystemClock, UuidIdGenerator},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Snapshot Storage ---
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repository = open_repository(&config, clock.clone()).await?;

    // --- 3. Hydrate the Store & Start the Writer ---
    let shutdown = CancellationToken::new();
    let (service, writer_handle) = StoreService::start(
        repository,
        clock.clone(),
        Arc::new(UuidIdGenerator),
        shutdown.clone(),
    )
    .await?;

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        service: Arc::new(service),
        directory: Arc::new(CampusDirectory::seeded()),
        auth: Arc::new(DemoAuthProvider),
        clock,
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    let app = web::router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- 7. Flush the Last Snapshot ---
    info!("Server stopped. Flushing pending snapshot...");
    shutdown.cancel();
    if let Err(e) = writer_handle.await {
        error!("Snapshot writer ended abnormally: {}", e);
    }
    info!("Shutdown complete.");

    Ok(())
}

async fn open_repository(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SnapshotRepository>, ApiError> {
    let repository: Arc<dyn SnapshotRepository> = match config.storage_backend {
        StorageBackend::File => {
            tokio::fs::create_dir_all(&config.storage_dir).await?;
            let store = JsonFileSnapshotStore::new(&config.storage_dir, &config.storage_key);
            info!("Using file storage at {}", store.path().display());
            Arc::new(store)
        }
        StorageBackend::Sqlite => {
            tokio::fs::create_dir_all(&config.storage_dir).await?;
            info!("Connecting to database...");
            let store = SqliteSnapshotStore::connect(
                &config.database_url,
                config.storage_key.clone(),
                clock,
            )
            .await?;
            info!("Database ready.");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; nothing will survive a restart");
            Arc::new(InMemorySnapshotStore::new())
        }
    };
    Ok(repository)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {}", e);
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
