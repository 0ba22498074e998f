// Main entry point - Dependency injection and server setup
use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use dashboard_builder::application::controller::DashboardController;
use dashboard_builder::application::dashboard_service::DashboardService;
use dashboard_builder::application::snapshot_repository::SnapshotRepository;
use dashboard_builder::infrastructure::config::load_app_config;
use dashboard_builder::infrastructure::file_snapshot_repository::FileSnapshotRepository;
use dashboard_builder::infrastructure::http_data_source::HttpDataSource;
use dashboard_builder::infrastructure::memory_snapshot_repository::MemorySnapshotRepository;
use dashboard_builder::presentation::app_state::AppState;
use dashboard_builder::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Snapshot persistence (infrastructure layer)
    let repository: Box<dyn SnapshotRepository> = match &config.storage.directory {
        Some(directory) => {
            let repository = FileSnapshotRepository::new(directory);
            tracing::info!("Persisting snapshots under {}", repository.directory().display());
            Box::new(repository)
        }
        None => {
            tracing::warn!("No storage directory configured, snapshots are kept in memory");
            Box::new(MemorySnapshotRepository::new())
        }
    };
    let data_source = Arc::new(HttpDataSource::new(Duration::from_secs(config.fetch.timeout_secs))?);

    // Controller task (application layer)
    let controller = DashboardController::load(repository);
    let dashboard = DashboardService::spawn(controller, data_source);

    // Build router (presentation layer)
    let router = build_router(Arc::new(AppState { dashboard }));

    // Start server
    let addr = config.server.bind_address();
    tracing::info!("Starting dashboard-builder service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(&addr).await?, router).await?;

    Ok(())
}
