pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use api::handlers;
pub use api::routes;

pub use logic::{QueryError, QueryService, Resource, ValidationError};

pub use model::*;

pub use store::{MemoryStore, PostgresStore, Store, StoreError};

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppConfig, StoreBackend};

/// Serve the API on an already bound listener until `shutdown` resolves,
/// then close the store.
pub async fn serve_with_store<S, F>(
    listener: TcpListener,
    store: Arc<S>,
    shutdown: F,
) -> anyhow::Result<()>
where
    S: Store + 'static,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = api::routes::create_router::<S>().with_state(store.clone());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    store.close().await;
    served?;
    Ok(())
}

/// Connect the configured store, optionally seed it, and serve until Ctrl-C.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let database_url = config.database_url()?;
            log::info!("Connecting to PostgreSQL...");
            let postgres_store =
                PostgresStore::new(&database_url, config.database.max_connections).await?;

            log::info!("Running database migrations...");
            postgres_store.migrate().await?;

            run_with_store(Arc::new(postgres_store), &config).await
        }
        StoreBackend::Memory => {
            log::warn!("Using in-memory store; data is lost on shutdown");
            run_with_store(Arc::new(MemoryStore::new()), &config).await
        }
    }
}

async fn run_with_store<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        log::info!("Loading seed data...");
        seed::load_seed_data(&*store).await?;
    }

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Server listening on http://{}", bind_address);

    serve_with_store(listener, store, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
