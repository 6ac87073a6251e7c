//! # Observability & Tracing
//!
//! This module provides the tracing infrastructure for the service.
//!
//! ## Configuration
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing`
//! crate. It uses a compact format that hides the crate/module prefix
//! (`with_target(false)`) and defaults to `info` when `RUST_LOG` is unset.
//!
//! ## What Gets Traced
//!
//! - **Startup**: resolved configuration (never credentials), dial attempt and result
//! - **Schema**: the sharding outcome, at WARN when it was skipped or failed
//! - **Operations**: one span per `create_order` / `count_orders` call
//! - **Errors**: the store's message alongside the order id, where one exists
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs (default)
//! RUST_LOG=info cargo run
//!
//! # Show full payloads with debug logs
//! RUST_LOG=debug cargo run
//!
//! # Quiet the driver, keep our own debug output
//! RUST_LOG=order_intake=debug,mongodb=warn cargo run
//! ```
//!
//! With `RUST_LOG=info` an order insert looks like:
//!
//! ```text
//! INFO create_order: Inserting order store="MongoDB at mongo.internal" namespace=hellomongo.orders
//! INFO create_order: Inserted order order_id=65f1c0ffee0123456789abcd namespace=hellomongo.orders
//! ```
//!
//! Passwords never appear: `ConnectionConfig`'s `Debug` output redacts them and
//! no log line records them.

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // Don't show module paths
        .compact() // Compact format shows spans inline (e.g., "create_order:")
        .init();
}
