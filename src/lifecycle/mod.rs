//! # System Lifecycle & Orchestration
//!
//! This module manages the runtime lifecycle of the service: bringing the
//! persistence layer up in the right order and shutting it down again.
//!
//! ## Startup Sequence
//!
//! 1. **Configuration** - [`ConnectionConfig`](crate::config::ConnectionConfig) is resolved once
//! 2. **Dial** - [`ConnectionManager::connect`](crate::store::ConnectionManager::connect);
//!    failure is fatal and there is no retry loop
//! 3. **Schema** - [`initialize_schema`](crate::schema::initialize_schema); never fatal
//! 4. **Ready** - the repository and client are wired with the connected pool
//!
//! ```rust,ignore
//! let config = ConnectionConfig::from_env()?;
//! let system = OrderSystem::start(&config).await?;   // steps 2-4
//! match &system.shard_outcome {
//!     ShardOutcome::Enabled { .. } => {}
//!     other => tracing::warn!(?other, "Serving without fresh sharding"),
//! }
//! ```
//!
//! ## Dependency Injection
//!
//! [`OrderSystem::with_pool`] runs steps 3 and 4 over any
//! [`SessionPool`](crate::store::SessionPool). Tests pass a
//! [`MemoryPool`](crate::store::memory::MemoryPool) and get the full system
//! without a database.
//!
//! ## Graceful Shutdown
//!
//! [`OrderSystem::shutdown`] drops the client and closes the pool. The MongoDB
//! driver waits for outstanding sessions to be returned before it closes its
//! connections.
//!
//! ## Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging for the entire
//! system. See the [`tracing`] module for details.

pub mod order_system;
pub mod tracing;

pub use order_system::*;
pub use self::tracing::*;
