//! Persistence layer: the session-pool abstraction and its implementations.
//!
//! # Main Components
//!
//! - [`SessionPool`] / [`StoreSession`] - The seam every consumer is generic over
//! - [`ConnectionManager`] - The MongoDB/DocumentDB pool used in production
//! - [`StoreError`] - Low-level store failures
//!
//! # Testing
//!
//! See [`memory`] for a working in-memory store and [`mock`] for scripted responses.

pub mod core;
pub mod memory;
pub mod mock;
pub mod mongo;

// Re-export core types for convenience
pub use self::core::*;
pub use mongo::{ConnectionManager, MongoSession};
