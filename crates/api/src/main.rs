use std::net::SocketAddr;
use std::sync::Arc;

use roster_core::store::RecordStore;
use roster_store::config::SheetsConfig;
use roster_store::{MemoryTable, SheetRecordStore, SheetsClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_api::config::{ServerConfig, StoreBackend};
use roster_api::router::build_app_router;
use roster_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "roster_api=debug,roster_store=debug,roster_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store,
        "Loaded server configuration"
    );

    // --- Record store ---
    let store: Arc<dyn RecordStore> = match config.store {
        StoreBackend::Sheets => {
            let sheets = SheetsConfig::from_env();
            tracing::info!(
                worksheet = %sheets.worksheet,
                credentials_file = %sheets.credentials_file.display(),
                "Using Google Sheets store"
            );
            Arc::new(SheetRecordStore::new(SheetsClient::new(sheets)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on exit");
            Arc::new(SheetRecordStore::new(MemoryTable::new()))
        }
    };

    // --- App state ---
    let state = AppState::new(store, config.clone());
    let count = state.reload_session().await;
    tracing::info!(count, "Initial character load");

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

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
