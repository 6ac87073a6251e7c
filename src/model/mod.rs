//! Pure data structures persisted by the [`OrderRepository`](crate::order_repository::OrderRepository).

pub mod order;

pub use order::*;
