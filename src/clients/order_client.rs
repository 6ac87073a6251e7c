use crate::model::OrderCreate;
use crate::order_repository::{OrderError, OrderRepository};
use crate::store::SessionPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Body returned when an order was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: String,
}

/// Body returned for a count query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCount {
    pub order_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Body returned on any failure. The request layer maps it to a server error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub error: String,
}

impl FailureResponse {
    fn new(context: &str, cause: &OrderError) -> Self {
        Self {
            error: format!("{}. Check logs: {}", context, cause),
        }
    }
}

/// The two operations exposed to whatever serves requests.
///
/// Wraps an [`OrderRepository`] and shapes its results into response bodies.
#[derive(Clone)]
pub struct OrderClient<P: SessionPool> {
    repository: OrderRepository<P>,
}

impl<P: SessionPool> OrderClient<P> {
    pub fn new(repository: OrderRepository<P>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &OrderRepository<P> {
        &self.repository
    }

    #[instrument(skip(self, order))]
    pub async fn create_order(&self, order: OrderCreate) -> Result<OrderCreated, FailureResponse> {
        debug!(?order, "create_order called");
        match self.repository.create_order(order).await {
            Ok(id) => {
                info!(order_id = %id, "Order accepted");
                Ok(OrderCreated { order_id: id.to_hex() })
            }
            Err(e) => {
                error!(error = %e, "Order not added");
                Err(FailureResponse::new("order not added to MongoDB", &e))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_order_count(&self) -> Result<OrderCount, FailureResponse> {
        match self.repository.count_orders().await {
            Ok(order_count) => Ok(OrderCount {
                order_count,
                timestamp: Utc::now(),
            }),
            Err(e) => {
                error!(error = %e, "Order count unavailable");
                Err(FailureResponse::new("couldn't query order count", &e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryPool;
    use crate::store::mock::MockPool;
    use crate::store::{Namespace, StoreError};

    fn namespace() -> Namespace {
        Namespace::new("hellomongo", "orders")
    }

    #[tokio::test]
    async fn test_response_shapes() {
        let client = OrderClient::new(OrderRepository::new(MemoryPool::new(), namespace()));

        let created = client
            .create_order(OrderCreate::new("a@b.com", "Widget", 9.99))
            .await
            .unwrap();
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["orderId"].as_str().unwrap().len(), 24);

        let count = client.get_order_count().await.unwrap();
        assert_eq!(count.order_count, 1);
        let json = serde_json::to_value(&count).unwrap();
        assert_eq!(json["orderCount"], 1);
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_failures_carry_driver_message() {
        let mock = MockPool::new();
        mock.expect_borrow().return_ok(());
        mock.expect_insert().return_err(StoreError::CommandRejected {
            code: 11000,
            message: "E11000 duplicate key error".into(),
        });
        mock.expect_borrow().return_err(StoreError::Unreachable("server selection timeout".into()));

        let client = OrderClient::new(OrderRepository::new(mock.clone(), namespace()));

        let failure = client
            .create_order(OrderCreate::new("a@b.com", "Widget", 9.99))
            .await
            .unwrap_err();
        assert!(failure.error.starts_with("order not added to MongoDB. Check logs: "));
        assert!(failure.error.contains("E11000 duplicate key error"));

        let failure = client.get_order_count().await.unwrap_err();
        assert!(failure.error.starts_with("couldn't query order count. Check logs: "));
        assert!(failure.error.contains("server selection timeout"));

        assert!(mock.inserted().is_empty());
        mock.verify();
    }
}
