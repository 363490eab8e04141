use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepcytes_api::{build_router, AppState, ServerConfig};
use deepcytes_core::defaults::SHUTDOWN_CLOSE_TIMEOUT_SECS;
use deepcytes_core::ServiceProbe;
use deepcytes_db::{config::redact_uri, Database, ElasticConfig, MongoConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "deepcytes_api=debug,deepcytes_db=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("deepcytes-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env();
    let elastic_config = ElasticConfig::from_env();
    let mongo_config = MongoConfig::from_env();

    info!(
        node = %elastic_config.node,
        auth = elastic_config.password.is_some(),
        tls_insecure = elastic_config.tls_insecure,
        "Search engine configured"
    );
    info!(uri = %redact_uri(&mongo_config.uri), "Document store configured");

    let db = Database::connect(&elastic_config, &mongo_config).await?;

    // Startup probes. The server listens even when a store is down.
    match db.elastic.cluster_health().await {
        Ok(health) => {
            info!(
                cluster = %health.cluster_name,
                status = %health.status,
                "Connected to Elasticsearch"
            );
            if let Err(e) = db.provision().await {
                warn!("Index provisioning failed, retrying on first use: {}", e);
            }
        }
        Err(e) => warn!(
            "Elasticsearch unavailable at startup, indices will be created on first use: {}",
            e
        ),
    }
    if db.files.probe().await {
        info!("Connected to MongoDB");
    } else {
        warn!("MongoDB unavailable at startup");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = build_router(AppState::from_database(&db, config));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped accepting connections, closing stores");
    match db
        .close(Duration::from_secs(SHUTDOWN_CLOSE_TIMEOUT_SECS))
        .await
    {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Error during shutdown: {}", e);
            std::process::exit(1);
        }
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully"),
        _ = terminate => info!("SIGTERM received, shutting down gracefully"),
    }
}
