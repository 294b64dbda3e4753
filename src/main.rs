//! movie-rentals server binary
//!
//! Usage: `movie-rentals [config.yaml]`. The config path may also come from
//! `RENTALS_CONFIG`; without one the defaults apply.

use anyhow::{Context, Result};
use rentals::config::{RentalsConfig, StorageBackend};
use rentals::server::ServerBuilder;
use rentals::storage::InMemoryStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> Result<RentalsConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RENTALS_CONFIG").ok());

    let mut config = match path {
        Some(path) => {
            tracing::info!(path = %path, "loading configuration");
            RentalsConfig::from_yaml_file(&path)?
        }
        None => RentalsConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config().context("invalid configuration")?;
    let adjustments = config.validate().context("invalid configuration")?;

    let builder = ServerBuilder::new().with_config(&config, adjustments);

    let builder = match config.storage.backend {
        StorageBackend::InMemory => {
            tracing::info!("using in-memory storage");
            builder.with_store(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "postgres")]
        StorageBackend::Postgres => {
            use rentals::storage::postgres::{PostgresStore, connect, ensure_schema};

            let url = config
                .storage
                .database_url
                .as_deref()
                .context("storage.database_url is required for postgres")?;
            let pool = connect(url, config.storage.max_connections).await?;
            ensure_schema(&pool).await?;
            tracing::info!("using PostgreSQL storage");
            builder.with_store(Arc::new(PostgresStore::new(pool)))
        }
        #[cfg(not(feature = "postgres"))]
        StorageBackend::Postgres => {
            anyhow::bail!(
                "storage.backend is postgres but the binary was built without the postgres feature"
            )
        }
    };

    builder.serve(&config.server.bind).await
}
