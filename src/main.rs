mod config;
mod db;
mod errors;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::services::{
    merger::Merger,
    reader::Reader,
    store::{PgUserStore, UserStore},
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub reader: Reader,
    pub merger: Merger,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the Reader and Merger to one store handle
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Self {
        let reader = Reader::new(store.clone(), config.fetch_limit, config.store_timeout());
        let merger = Merger::new(store.clone(), config.store_timeout());

        Self {
            config,
            store,
            reader,
            merger,
            start_time: Instant::now(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocular_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let port = config.port;

    tracing::info!("Starting Ocular Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app_env);

    // Initialize PostgreSQL connection pool
    let pool = create_pool(&config).await?;
    tracing::info!("PostgreSQL connected");

    // Run database migrations
    run_migrations(&pool).await?;

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
    let state = Arc::new(AppState::new(config, store));

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
