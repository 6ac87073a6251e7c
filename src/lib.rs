//! # Order Intake
//!
//! > **Accept an order, store it, count them.**
//!
//! This crate is the persistence core of a small order-intake service. It connects
//! to a replicated, possibly sharded MongoDB or Amazon DocumentDB deployment,
//! prepares the `orders` collection once, and exposes two operations: create an
//! order and count orders.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Explicit Wiring, No Globals
//! The connection pool is an ordinary value ([`ConnectionManager`](store::ConnectionManager))
//! built at startup and injected into the [`OrderRepository`](order_repository::OrderRepository).
//! Everything downstream is generic over [`SessionPool`](store::SessionPool), so the
//! same code runs against an in-memory store in tests.
//!
//! ### One Session Per Operation
//! Each repository call borrows its own session and drops it before returning.
//! Release is tied to `Drop`, so a failing insert returns its session exactly like
//! a successful one. Concurrency control is the pool's job; the repository holds
//! no locks.
//!
//! ### Backends Are a Type
//! Whether we talk to MongoDB or DocumentDB is decided once, in
//! [`config::Backend`], and carries the TLS and port rules with it.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. Configuration ([`config`])
//! - **Role**: Environment variables and the mounted password secret → [`ConnectionConfig`](config::ConnectionConfig).
//!
//! ### 2. Persistence ([`store`])
//! - **Role**: The [`SessionPool`](store::SessionPool) seam, the MongoDB
//!   [`ConnectionManager`](store::ConnectionManager), and test doubles.
//!
//! ### 3. Schema ([`schema`])
//! - **Role**: Best-effort hashed sharding of the orders collection, reported as a
//!   [`ShardOutcome`](schema::ShardOutcome).
//!
//! ### 4. Orders ([`model`], [`order_repository`], [`clients`])
//! - **Role**: The `Order` document, the repository that writes and counts it, and
//!   the [`OrderClient`](clients::OrderClient) that shapes responses.
//!
//! ### 5. Lifecycle ([`lifecycle`])
//! - **Role**: Startup sequence, shutdown, and tracing setup.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! export MONGOHOST=localhost:27017 MONGOUSER=orders MONGOPASSWORD=secret
//! RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod order_repository;
pub mod schema;
pub mod store;
