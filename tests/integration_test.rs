use order_intake::config::{ConnectionConfig, Password};
use order_intake::lifecycle::OrderSystem;
use order_intake::model::OrderCreate;
use order_intake::schema::{ShardOutcome, SkipReason};
use order_intake::store::memory::MemoryPool;

fn config() -> ConnectionConfig {
    ConnectionConfig::new("localhost", "orders", Password::new("secret")).expect("valid config")
}

/// Full end-to-end test over the in-memory store.
/// Boots the system, places an order and checks the count moved by exactly one.
#[tokio::test]
async fn test_full_order_system_integration() {
    let pool = MemoryPool::new();
    let config = config();
    let system = OrderSystem::with_pool(pool.clone(), &config).await;
    assert!(system.shard_outcome.is_enabled());

    let before = system
        .order_client
        .get_order_count()
        .await
        .expect("Failed to count orders")
        .order_count;

    let created = system
        .order_client
        .create_order(OrderCreate::new("a@b.com", "Widget", 9.99))
        .await
        .expect("Failed to create order");
    assert_eq!(created.order_id.len(), 24);
    assert!(created.order_id.chars().all(|c| c.is_ascii_hexdigit()));

    let after = system
        .order_client
        .get_order_count()
        .await
        .expect("Failed to count orders")
        .order_count;
    assert_eq!(after, before + 1);

    let stored = pool.documents(&config.namespace());
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get_object_id("_id").unwrap().to_hex(), created.order_id);
    assert_eq!(stored[0].get_str("product").unwrap(), "Widget");
    assert_eq!(stored[0].get_f64("total").unwrap(), 9.99);
    assert_eq!(stored[0].get_str("status").unwrap(), "Open");

    assert_eq!(pool.open_sessions(), 0, "every session should be returned");
    system.shutdown().await;
}

/// A caller-supplied status is never persisted.
#[tokio::test]
async fn test_status_from_request_body_is_ignored() {
    let pool = MemoryPool::new();
    let config = config();
    let system = OrderSystem::with_pool(pool.clone(), &config).await;

    let body = r#"{"emailAddress":"x@y.com","product":"Gadget","total":12.5,"status":"Closed","id":"abc"}"#;
    let order: OrderCreate = serde_json::from_str(body).unwrap();
    let created = system.order_client.create_order(order).await.unwrap();

    let stored = pool.documents(&config.namespace());
    assert_eq!(stored[0].get_str("status").unwrap(), "Open");
    assert_ne!(created.order_id, "abc");
}

/// A restart against an already sharded collection keeps serving.
#[tokio::test]
async fn test_restart_with_sharded_collection() {
    let pool = MemoryPool::new();
    let config = config();

    let first = OrderSystem::with_pool(pool.clone(), &config).await;
    assert!(first.shard_outcome.is_enabled());
    drop(first);

    let second = OrderSystem::with_pool(pool.clone(), &config).await;
    assert_eq!(
        second.shard_outcome,
        ShardOutcome::Skipped { reason: SkipReason::AlreadySharded }
    );

    second
        .order_client
        .create_order(OrderCreate::new("a@b.com", "Widget", 9.99))
        .await
        .expect("sharding failure must not block inserts");
    assert_eq!(second.order_client.get_order_count().await.unwrap().order_count, 1);
}

/// A backend without sharding support keeps serving.
#[tokio::test]
async fn test_backend_without_sharding() {
    let pool = MemoryPool::new().without_sharding();
    let system = OrderSystem::with_pool(pool, &config()).await;
    assert_eq!(
        system.shard_outcome,
        ShardOutcome::Skipped { reason: SkipReason::Unsupported }
    );

    system
        .order_client
        .create_order(OrderCreate::new("a@b.com", "Widget", 9.99))
        .await
        .expect("insert should succeed");
}

/// Store outage: both operations fail and nothing is written.
#[tokio::test]
async fn test_store_outage() {
    let pool = MemoryPool::new();
    let config = config();
    let system = OrderSystem::with_pool(pool.clone(), &config).await;

    pool.set_unreachable(true);
    let failure = system
        .order_client
        .create_order(OrderCreate::new("a@b.com", "Widget", 9.99))
        .await
        .unwrap_err();
    assert!(failure.error.contains("unreachable"));
    assert!(system.order_client.get_order_count().await.is_err());

    pool.set_unreachable(false);
    assert!(pool.documents(&config.namespace()).is_empty());
    assert_eq!(system.order_client.get_order_count().await.unwrap().order_count, 0);
}

/// Concurrent requests each borrow their own session.
#[tokio::test]
async fn test_concurrent_orders() {
    let pool = MemoryPool::new();
    let system = OrderSystem::with_pool(pool.clone(), &config()).await;

    let mut handles = vec![];
    for i in 0..20 {
        let order_client = system.order_client.clone();
        handles.push(tokio::spawn(async move {
            order_client
                .create_order(OrderCreate::new(format!("user{}@example.com", i), "Widget", 1.0))
                .await
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap().expect("order should be created");
        assert!(ids.insert(created.order_id), "ids must be unique");
    }

    assert_eq!(system.order_client.get_order_count().await.unwrap().order_count, 20);
    assert_eq!(pool.open_sessions(), 0);
}
