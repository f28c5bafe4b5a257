use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use skybook_api::{app, demo, state::AppState};
use skybook_core::Store;
use skybook_store::app_config::{Config, StoreBackend};
use skybook_store::{MemoryStore, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skybook_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Skybook API on port {}", config.server.port);

    let store: Arc<dyn Store> = match config.store.backend {
        StoreBackend::Memory => {
            let store =
                MemoryStore::with_lock_wait(Duration::from_millis(config.store.lock_wait_ms));
            if config.store.seed_demo_data {
                demo::seed(&store).await;
            }
            Arc::new(store)
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("store.database_url is required for postgres"))?;
            let store =
                PgStore::connect(url, config.store.max_connections, config.store.lock_wait_ms)
                    .await?;
            store.migrate().await?;
            Arc::new(store)
        }
    };

    let app = app(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
