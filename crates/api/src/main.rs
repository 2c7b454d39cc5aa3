use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobscope_api::background;
use jobscope_api::config::ServerConfig;
use jobscope_api::router::build_app_router;
use jobscope_api::state::AppState;
use jobscope_core::catalog::TypeCatalog;
use jobscope_db::MongoHandle;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobscope_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        environment = config.environment.as_str(),
        "Loaded server configuration",
    );

    // --- Artifact type catalog ---
    let catalog = TypeCatalog::from_path(&config.artifact_types_path)
        .expect("Failed to load artifact type catalog");
    tracing::info!(types = catalog.len(), "Artifact type catalog loaded");

    // --- MongoDB handle ---
    let mongo = Arc::new(MongoHandle::new());
    if let Some(uri) = config.mongo_uri() {
        // Best-effort initial connect; the dashboard stays interactive and
        // the client can connect explicitly if this fails.
        match mongo
            .connect(uri, Duration::from_secs(config.connect_timeout_secs))
            .await
        {
            Ok(()) => tracing::info!(database = %config.database_name(), "Connected to MongoDB"),
            Err(err) => tracing::warn!(error = %err, "Initial MongoDB connect failed"),
        }
    } else {
        tracing::warn!(
            environment = config.environment.as_str(),
            "No MongoDB URI configured; connect via the API once it is set",
        );
    }

    // --- App state ---
    let state = AppState {
        mongo,
        catalog: Arc::new(catalog),
        config: Arc::new(config.clone()),
    };

    // --- Background auto-refresh ---
    let refresh_cancel = tokio_util::sync::CancellationToken::new();
    let refresh_handle = tokio::spawn(background::refresh::run(
        state.clone(),
        refresh_cancel.clone(),
    ));

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    refresh_cancel.cancel();
    let _ = refresh_handle.await;
    tracing::info!("Shutdown complete");
}

/// Resolve when the process receives a shutdown signal.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
