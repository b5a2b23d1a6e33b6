use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartelera_core::{
    start_sweeper, validate_config, CineCalidadLister, CinemetaClient, Config, MagnetInspector,
    MetaCache, MovieResolver, SqliteStore,
};

use cartelera_server::api::create_router;
use cartelera_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CARTELERA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration; a missing file means defaults, which are
    // enough to serve the addon.
    let config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        cartelera_core::load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        info!("No config file at {:?}, using defaults", config_path);
        Config::default()
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!("Database path: {:?}", config.database.path);
    info!("Source site: {}", config.site.base_url);

    // Persisted store
    let store = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to open store")?,
    );
    info!("Store initialized");

    // Cache layer and its expiry sweeper
    let cache = MetaCache::new(store.clone());
    let sweeper = start_sweeper(
        store.clone(),
        Duration::from_secs(config.cache.sweep_interval_secs),
    );
    info!(
        "Cache sweeper started (every {}s)",
        config.cache.sweep_interval_secs
    );

    // Collaborators
    let lister = Arc::new(CineCalidadLister::new(config.site.clone()));
    let metadata = Arc::new(CinemetaClient::new(config.cinemeta.clone()));
    let inspector = Arc::new(MagnetInspector::new());

    // The resolver owns the whole lookup pipeline
    let resolver = Arc::new(MovieResolver::new(
        store,
        cache,
        lister,
        metadata,
        inspector,
        config.cache.clone(),
    ));

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), resolver));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting addon server on {}", addr);
    info!("Manifest at http://{}/manifest.json", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Cancel the sweeper so no timer outlives the server.
    info!("Server shutting down...");
    sweeper.stop().await;
    info!("Cache sweeper stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
