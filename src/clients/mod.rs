//! Request-facing wrappers around the [`OrderRepository`](crate::order_repository::OrderRepository).

pub mod order_client;

pub use order_client::*;
