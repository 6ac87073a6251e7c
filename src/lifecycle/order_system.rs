use crate::clients::OrderClient;
use crate::config::ConnectionConfig;
use crate::order_repository::OrderRepository;
use crate::schema::{initialize_schema, ShardOutcome};
use crate::store::{ConnectionManager, SessionPool, StoreError};
use tracing::info;

/// The runtime orchestrator for the order intake service.
///
/// `OrderSystem` is responsible for:
/// - **Startup Sequence**: dial the database, prepare the schema, wire the repository
/// - **Dependency Wiring**: the pool is injected into the repository, never global
/// - **Shutdown**: releasing the connection pool
///
/// # Example
///
/// ```ignore
/// let config = ConnectionConfig::from_env()?;
/// let system = OrderSystem::start(&config).await?;
///
/// let created = system.order_client.create_order(order).await?;
/// let count = system.order_client.get_order_count().await?;
///
/// system.shutdown().await;
/// ```
pub struct OrderSystem<P: SessionPool> {
    /// Client exposing the request-facing operations
    pub order_client: OrderClient<P>,

    /// What happened when sharding was attempted at startup
    pub shard_outcome: ShardOutcome,

    pool: P,
}

impl OrderSystem<ConnectionManager> {
    /// Dials the configured database and brings the system up.
    ///
    /// # Returns
    ///
    /// - `Ok(system)` once the pool is connected; the sharding attempt never fails startup
    /// - `Err(StoreError)` if the dial failed. The caller should treat this as fatal.
    pub async fn start(config: &ConnectionConfig) -> Result<Self, StoreError> {
        let pool = ConnectionManager::connect(config).await?;
        Ok(Self::with_pool(pool, config).await)
    }
}

impl<P: SessionPool> OrderSystem<P> {
    /// Brings the system up over an already connected pool.
    pub async fn with_pool(pool: P, config: &ConnectionConfig) -> Self {
        let shard_outcome = initialize_schema(&pool, config).await;

        let repository = OrderRepository::new(pool.clone(), config.namespace());
        let order_client = OrderClient::new(repository);

        info!(store = %pool.describe(), namespace = %config.namespace(), "Order system ready");
        Self {
            order_client,
            shard_outcome,
            pool,
        }
    }

    /// Gracefully shuts down the system.
    ///
    /// Drops the client (and with it the repository's pool handle), then closes
    /// the pool. Clones of the client held elsewhere must be dropped first.
    pub async fn shutdown(self) {
        info!("Shutting down system...");
        drop(self.order_client);
        self.pool.close().await;
        info!("System shutdown complete.");
    }
}
