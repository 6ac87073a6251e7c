//! Order persistence: the only readable and writable surface for Orders.

pub mod error;

pub use error::*;

use crate::model::{Order, OrderCreate};
use crate::store::{Namespace, SessionPool, StoreError, StoreSession};
use mongodb::bson::{self, oid::ObjectId};
use tracing::{debug, info, instrument, warn};

/// Inserts and counts orders on top of an injected [`SessionPool`].
///
/// Each call borrows its own session and drops it before returning, so one
/// repository can be cloned into any number of concurrent request tasks without
/// locking. Nothing is cached between calls.
#[derive(Clone)]
pub struct OrderRepository<P: SessionPool> {
    pool: P,
    namespace: Namespace,
}

impl<P: SessionPool> OrderRepository<P> {
    pub fn new(pool: P, namespace: Namespace) -> Self {
        Self { pool, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Persists a new `Open` order and returns its generated id.
    ///
    /// The id is generated here; nothing the caller sends can replace it.
    /// Failures are logged and returned without retry.
    #[instrument(skip(self, params), fields(namespace = %self.namespace))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<ObjectId, OrderError> {
        debug!(?params, "create_order called");
        let mut session = self.borrow().await?;

        let order = Order::open(ObjectId::new(), params);
        let document = bson::to_document(&order).map_err(|e| OrderError::Encoding(StoreError::from(e)))?;

        info!(store = %self.pool.describe(), "Inserting order");
        match session.insert_one(&self.namespace, document).await {
            Ok(()) => {
                info!(order_id = %order.id, "Inserted order");
                Ok(order.id)
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Problem inserting order");
                Err(OrderError::InsertFailed(e))
            }
        }
    }

    /// Counts every order in the collection.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn count_orders(&self) -> Result<u64, OrderError> {
        let mut session = self.borrow().await?;

        info!(store = %self.pool.describe(), "Querying order count");
        match session.count_documents(&self.namespace).await {
            Ok(count) => {
                info!(count, "Order count");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Problem querying number of orders");
                Err(OrderError::CountFailed(e))
            }
        }
    }

    async fn borrow(&self) -> Result<P::Session, OrderError> {
        self.pool.borrow_session().await.map_err(|e| {
            warn!(error = %e, "Could not borrow a session");
            OrderError::Unavailable(e)
        })
    }
}
