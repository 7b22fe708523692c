mod api;
mod metrics;
mod poller;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_core::{
    create_authenticator, load_config, validate_config, Authenticator, Dispatcher,
    InteractiveSession, QBittorrentClient, RelocationService, SanitizedConfig, TelegramClient,
    TorrentClient,
};

use api::create_router;
use poller::Poller;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    let json = std::env::var("COURIER_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run() -> Result<()> {
    init_logging();

    // Determine config path
    let config_path = std::env::var("COURIER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!(version = VERSION, "Starting courier");
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded successfully"
    );

    // Torrent daemon
    info!("Initializing qBittorrent client at {}", config.qbittorrent.url);
    let torrents = Arc::new(
        QBittorrentClient::new(config.qbittorrent.clone())
            .context("Failed to create qBittorrent client")?,
    );
    info!("Using torrent client: {}", torrents.name());

    // Chat API
    let telegram =
        Arc::new(TelegramClient::new(&config.telegram).context("Failed to create Telegram client")?);

    // Authorization gate
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Relocation and conversations
    let relocation = Arc::new(RelocationService::from_client(
        Arc::clone(&torrents),
        config.relocation.clone(),
    ));
    let session = Arc::new(InteractiveSession::new(
        Arc::clone(&relocation),
        telegram.clone(),
        telegram.clone(),
    ));
    let dispatcher = Arc::new(
        Dispatcher::new(
            authenticator,
            torrents,
            relocation,
            session,
            telegram.clone(),
        )
        .with_download_path(config.qbittorrent.download_path.clone()),
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Health and metrics endpoint
    let server_handle = if config.server.enabled {
        let addr = SocketAddr::new(config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        info!("Serving health and metrics on {}", addr);

        let app = create_router(Arc::new(AppState::new(config.clone())));
        let mut server_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }))
    } else {
        info!("Health endpoint disabled in config");
        None
    };

    let poll_handle = tokio::spawn(Poller::new(telegram, dispatcher).run(shutdown_tx.subscribe()));

    shutdown_signal().await;
    info!("Shutting down...");
    let _ = shutdown_tx.send(());

    poll_handle.await.context("Poll loop panicked")?;
    if let Some(handle) = server_handle {
        handle.await.context("Server task panicked")?;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
}
