use std::sync::Arc;

use anyhow::{Context, Result};
use domain::clients::ResilientLocationClient;
use domain::services::HistoryService;
use geotracker_api::app::{history_routers, HistoryState};
use geotracker_api::config::{Config, Service};
use geotracker_api::middleware::{init_metrics, logging::init_logging};
use geotracker_api::routes::health::HealthProbe;
use geotracker_api::server;
use geotracker_api::services::HttpLocationClient;
use persistence::RecordRepository;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let service = Service::History;
    let config = Config::load(service).context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics(service.file_stem()).context("Failed to initialize metrics")?;

    info!("Starting history service v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.to_pool_config())
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let shutdown = CancellationToken::new();

    let resilience = Arc::new(config.remote.resilience(service.remote_name()));
    let locations = HttpLocationClient::new(&config.remote.base_url, config.remote.timeout())?;
    let locations = Arc::new(ResilientLocationClient::new(
        Arc::new(locations),
        resilience.clone(),
    ));

    let history_service = Arc::new(HistoryService::new(
        Arc::new(RecordRepository::new(pool.clone())),
        locations,
        shutdown.clone(),
    ));

    let state = HistoryState {
        service: history_service,
        health: HealthProbe {
            service: "history",
            pool: Some(pool.clone()),
            remote: Some(resilience),
        },
    };
    let routers = history_routers(state, config.request_timeout());

    let public = TcpListener::bind(config.public_addr()?).await?;
    let internal = TcpListener::bind(config.internal_addr()?).await?;

    tokio::spawn(server::shutdown_signal(shutdown.clone()));
    server::run(public, internal, routers, shutdown).await?;

    pool.close().await;
    info!("History service stopped");
    Ok(())
}
