use pgcompare::api::{self, AppState};
use pgcompare::config::Config;
use pgcompare::platform::{PlatformRegistry, PoolSettings};
use pgcompare::security::CronAuthConfig;
use pgcompare::store::{MemorySnapshotStore, PostgresSnapshotStore, SnapshotStore};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env file if present
    let dotenv_result = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&config.log_dir).unwrap_or_else(|e| {
        eprintln!(
            "Warning: Could not create log directory {}: {}",
            config.log_dir.display(),
            e
        );
    });

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "pgcompare.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pgcompare=debug")),
        )
        .with(fmt::layer().with_target(true))
        // File output with JSON format for easy parsing
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_writer(non_blocking),
        )
        .init();

    debug!("Logging initialized - log directory: {}", config.log_dir.display());

    if let Err(e) = dotenv_result {
        warn!("No .env file found or error loading it: {}", e);
    }

    let socket_addr = config.socket_addr()?;

    info!("Starting pgcompare on {}", socket_addr);
    info!("Environment: {}", config.environment);
    info!("Max connections per pool: {}", config.max_connections_per_pool);

    let registry = PlatformRegistry::from_config(&config);
    for platform in registry.list_all() {
        if platform.is_configured() {
            info!("Platform {} configured", platform.id());
        } else {
            warn!("Platform {} not configured ({} is not set)", platform.id(), platform.env_key());
        }
    }

    let store = snapshot_store(&config).await;
    info!("Latency snapshot store: {}", store.backend());

    if config.cron_secret.is_none() && !config.is_local_environment() {
        warn!(
            "CRON_SECRET is not set; latency collection is disabled in environment '{}'",
            config.environment
        );
    }

    let cron_auth = Arc::new(CronAuthConfig::new(
        config.cron_secret.clone(),
        config.environment.clone(),
    ));
    let state = Arc::new(AppState::new(&config, registry, store));

    let app = api::router(state.clone(), cron_auth).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&socket_addr).await?;
    info!("Server listening on {}", socket_addr);

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.registry.disconnect_all().await;
    info!("Server shutdown complete");

    Ok(())
}

/// Postgres-backed store when a metadata database is configured
async fn snapshot_store(config: &Config) -> Arc<dyn SnapshotStore> {
    let Some(url) = config.metadata_url.as_deref() else {
        warn!("DATABASE_URL_METADATA is not set; latency snapshots are kept in memory");
        return Arc::new(MemorySnapshotStore::new());
    };

    let settings = PoolSettings {
        max_size: config.max_connections_per_pool,
        timeout: config.pool_timeout,
    };

    match PostgresSnapshotStore::connect(url, settings).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Snapshot store unavailable, falling back to memory: {}", e);
            Arc::new(MemorySnapshotStore::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
