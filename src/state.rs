//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::db;
use crate::repositories::in_memory::InMemoryStore;
use crate::repositories::postgres::{
    PgAccountRepository, PgIdempotencyRepository, PgTransferRepository,
};
use crate::repositories::{AccountRepository, IdempotencyRepository, TransferRepository};
use crate::services::exchange_client::HttpExchangeRateClient;
use crate::services::exchange_service::{
    ExchangeRateClient, ExchangeService, MockExchangeRateClient,
};
use crate::services::monitor_service::MonitorService;
use crate::services::transfer_orchestrator::TransferOrchestrator;
use crate::services::transfer_service::{TransferService, TransferValidator};

/// The three storage ports, backed by one concrete store.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub transfers: Arc<dyn TransferRepository>,
    pub idempotency: Arc<dyn IdempotencyRepository>,
    /// Name reported by the health check
    pub backend: &'static str,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            accounts: Arc::new(store.clone()),
            transfers: Arc::new(store.clone()),
            idempotency: Arc::new(store),
            backend: "memory",
        }
    }

    pub fn postgres(pool: db::DbPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            transfers: Arc::new(PgTransferRepository::new(pool.clone())),
            idempotency: Arc::new(PgIdempotencyRepository::new(pool)),
            backend: "postgres",
        }
    }
}

/// Services wired together, cloned into each request via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub orchestrator: TransferOrchestrator,
    pub monitor: MonitorService,
}

impl AppState {
    pub fn new(repositories: Repositories, rates: Arc<dyn ExchangeRateClient>) -> Self {
        let exchange = ExchangeService::new(rates);
        let validator = TransferValidator::new(repositories.accounts.clone(), exchange);
        let transfer_service = TransferService::new(validator, repositories.transfers.clone());
        let orchestrator = TransferOrchestrator::new(
            transfer_service,
            repositories.idempotency.clone(),
            repositories.transfers.clone(),
        );
        let monitor = MonitorService::new(repositories.transfers.clone());

        Self {
            repositories,
            orchestrator,
            monitor,
        }
    }

    /// Build state from configuration, connecting and migrating the database if needed.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let repositories = match config.storage_backend {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

                let pool = db::create_pool(url, config.database_max_connections).await?;
                tracing::info!("Database pool created");

                db::run_migrations(&pool).await?;
                tracing::info!("Database migrations complete");

                Repositories::postgres(pool)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Repositories::in_memory()
            }
        };

        let rates: Arc<dyn ExchangeRateClient> = match &config.exchange_rate_api_url {
            Some(url) => {
                tracing::info!(%url, "Using remote exchange rate API");
                Arc::new(HttpExchangeRateClient::new(url, config.exchange_timeout())?)
            }
            None => {
                tracing::info!(
                    latency_ms = config.exchange_latency_ms,
                    failure_rate = config.exchange_failure_rate,
                    "Using simulated exchange rates"
                );
                Arc::new(MockExchangeRateClient::new(
                    config.exchange_latency(),
                    config.exchange_failure_rate,
                ))
            }
        };

        Ok(Self::new(repositories, rates))
    }
}
