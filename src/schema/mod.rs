//! # Schema Initializer
//!
//! One-time, best-effort preparation of the orders collection: enable hashed
//! sharding on the configured shard key.
//!
//! The attempt never blocks startup. The collection may already be sharded, or
//! the backend may not support sharding at all; either way the service serves
//! traffic. The outcome is reported as a [`ShardOutcome`] so callers (and logs)
//! can tell the cases apart.
//!
//! The command runs in unacknowledged mode: only its reply is advisory, and no
//! order data is written.

use crate::config::ConnectionConfig;
use crate::store::{SessionPool, StoreError, StoreSession};
use mongodb::bson::{doc, Document};
use std::fmt;
use tracing::{info, instrument, warn};

const ILLEGAL_OPERATION: i32 = 20;
const ALREADY_INITIALIZED: i32 = 23;
const COMMAND_NOT_FOUND: i32 = 59;
const COMMAND_NOT_SUPPORTED: i32 = 115;

/// Why a sharding attempt was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySharded,
    Unsupported,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadySharded => write!(f, "collection is already sharded"),
            SkipReason::Unsupported => write!(f, "sharding is not supported by this backend"),
        }
    }
}

/// Result of the sharding attempt. None of the variants is fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum ShardOutcome {
    /// The server accepted `shardCollection`.
    Enabled { reply: Document },
    /// The server refused for a known, expected reason.
    Skipped { reason: SkipReason },
    /// Anything else went wrong. Ignorable.
    Failed { error: StoreError },
}

impl ShardOutcome {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ShardOutcome::Enabled { .. })
    }

    fn from_result(result: Result<Document, StoreError>) -> Self {
        match result {
            Ok(reply) => ShardOutcome::Enabled { reply },
            Err(error) => match error.code() {
                Some(ALREADY_INITIALIZED) => ShardOutcome::Skipped { reason: SkipReason::AlreadySharded },
                Some(ILLEGAL_OPERATION) if error.to_string().contains("already") => {
                    ShardOutcome::Skipped { reason: SkipReason::AlreadySharded }
                }
                Some(COMMAND_NOT_FOUND | COMMAND_NOT_SUPPORTED) => {
                    ShardOutcome::Skipped { reason: SkipReason::Unsupported }
                }
                _ => ShardOutcome::Failed { error },
            },
        }
    }
}

/// `{ shardCollection: "<db>.<coll>", key: { <shard_key>: "hashed" } }`
pub fn shard_collection_command(config: &ConnectionConfig) -> Document {
    let mut key = Document::new();
    key.insert(config.shard_key.clone(), "hashed");
    doc! {
        "shardCollection": config.namespace().to_string(),
        "key": key,
    }
}

/// Attempts to shard the orders collection. Never fails.
#[instrument(skip(pool, config), fields(namespace = %config.namespace(), shard_key = %config.shard_key))]
pub async fn initialize_schema<P: SessionPool>(pool: &P, config: &ConnectionConfig) -> ShardOutcome {
    let result = match pool.borrow_session().await {
        Ok(mut session) => {
            session.set_acknowledged(false);
            session
                .run_command(&config.database, shard_collection_command(config))
                .await
        }
        Err(e) => Err(e),
    };

    let outcome = ShardOutcome::from_result(result);
    match &outcome {
        ShardOutcome::Enabled { reply } => info!(?reply, "Created sharded collection"),
        ShardOutcome::Skipped { reason } => {
            warn!(%reason, "Could not create sharded collection. You can ignore this")
        }
        ShardOutcome::Failed { error } => {
            warn!(%error, "Could not create/re-create sharded collection. You can ignore this")
        }
    }
    outcome
}
