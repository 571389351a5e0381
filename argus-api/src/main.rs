//! # Argus API Server
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p argus-api
//! ```
//!
//! Configuration comes from the environment (and `.env`); see
//! [`argus_api::config`]. Set `LOG_FORMAT=json` for JSON log lines.

use anyhow::Context;
use argus_api::{
    app::{build_router, register_policies, AppState},
    config::Config,
};
use argus_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool},
    },
    storage::{ObjectStore, S3ObjectStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Argus API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("failed to load configuration")?;

    let pool_config = config
        .database
        .pool_config()
        .context("invalid database settings")?;
    let pool = create_pool(pool_config)
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;

    let store = S3ObjectStore::connect(&config.storage.s3).await;
    store
        .ensure_bucket()
        .await
        .context("failed to prepare the storage bucket")?;
    let storage: Arc<dyn ObjectStore> = Arc::new(store);

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config, storage);

    match state.authorizer.load().await {
        Ok(count) => tracing::info!(count, "loaded persisted policies"),
        Err(e) => tracing::warn!(error = %e, "failed to load persisted policies"),
    }
    let registered = register_policies(&state.authorizer).await;
    tracing::info!(registered, total = state.authorizer.len(), "policies registered");

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "argus_api=debug,argus_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, draining connections");
}
