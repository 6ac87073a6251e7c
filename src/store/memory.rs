//! # In-Memory Store
//!
//! A [`SessionPool`] that keeps documents in process memory. It behaves like a
//! single-node deployment and is used to exercise the repository, the schema
//! initializer and the full [`OrderSystem`](crate::lifecycle::OrderSystem)
//! without a database.
//!
//! Failure injection:
//! - [`MemoryPool::set_unreachable`] makes every borrow and every operation fail
//!   with [`StoreError::Unreachable`].
//! - [`MemoryPool::without_sharding`] rejects `shardCollection` as an unknown command.
//!
//! The pool also tracks how many sessions are currently checked out, so tests
//! can assert that sessions are returned on every path.

use crate::store::{Namespace, SessionPool, StoreError, StoreSession};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const ILLEGAL_OPERATION: i32 = 20;
const COMMAND_NOT_FOUND: i32 = 59;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<Namespace, Vec<Document>>,
    sharded: HashSet<String>,
    unreachable: bool,
    sharding_unsupported: bool,
    open_sessions: usize,
    sessions_borrowed: usize,
}

/// An in-memory document store with session accounting.
#[derive(Clone, Default)]
pub struct MemoryPool {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects `shardCollection` the way a backend without sharding support does.
    pub fn without_sharding(self) -> Self {
        self.state().sharding_unsupported = true;
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Snapshot of the documents stored in `namespace`.
    pub fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        self.state().collections.get(namespace).cloned().unwrap_or_default()
    }

    pub fn is_sharded(&self, namespace: &Namespace) -> bool {
        self.state().sharded.contains(&namespace.to_string())
    }

    /// Sessions currently checked out and not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.state().open_sessions
    }

    /// Total number of successful borrows since creation.
    pub fn sessions_borrowed(&self) -> usize {
        self.state().sessions_borrowed
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unreachable() -> StoreError {
    StoreError::Unreachable("in-memory store is offline".to_string())
}

#[async_trait]
impl SessionPool for MemoryPool {
    type Session = MemorySession;

    async fn borrow_session(&self) -> Result<MemorySession, StoreError> {
        let mut state = self.state();
        if state.unreachable {
            return Err(unreachable());
        }
        state.open_sessions += 1;
        state.sessions_borrowed += 1;
        Ok(MemorySession {
            state: self.state.clone(),
            acknowledged: true,
        })
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

/// A session over a [`MemoryPool`]. Dropping it decrements the open-session count.
pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    acknowledged: bool,
}

impl MemorySession {
    /// Returns `true` while the session is in acknowledged (safe) mode.
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    fn shard_collection(state: &mut MemoryState, command: &Document) -> Result<Document, StoreError> {
        if state.sharding_unsupported {
            return Err(StoreError::CommandRejected {
                code: COMMAND_NOT_FOUND,
                message: "no such command: 'shardCollection'".to_string(),
            });
        }
        let namespace = command
            .get_str("shardCollection")
            .map_err(|e| StoreError::Encoding(e.to_string()))?
            .to_string();
        if !state.sharded.insert(namespace.clone()) {
            return Err(StoreError::CommandRejected {
                code: ILLEGAL_OPERATION,
                message: format!("sharding already enabled for collection {}", namespace),
            });
        }
        Ok(doc! { "collectionsharded": namespace, "ok": 1.0 })
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn insert_one(&mut self, namespace: &Namespace, document: Document) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if state.unreachable {
            return Err(unreachable());
        }
        state.collections.entry(namespace.clone()).or_default().push(document);
        Ok(())
    }

    async fn count_documents(&mut self, namespace: &Namespace) -> Result<u64, StoreError> {
        let state = lock(&self.state);
        if state.unreachable {
            return Err(unreachable());
        }
        Ok(state.collections.get(namespace).map_or(0, |docs| docs.len() as u64))
    }

    async fn run_command(&mut self, _database: &str, command: Document) -> Result<Document, StoreError> {
        let mut state = lock(&self.state);
        if state.unreachable {
            return Err(unreachable());
        }
        match command.keys().next().map(String::as_str) {
            Some("ping") => Ok(doc! { "ok": 1.0 }),
            Some("shardCollection") => Self::shard_collection(&mut state, &command),
            other => Err(StoreError::CommandRejected {
                code: COMMAND_NOT_FOUND,
                message: format!("no such command: '{}'", other.unwrap_or_default()),
            }),
        }
    }

    fn set_acknowledged(&mut self, acknowledged: bool) {
        self.acknowledged = acknowledged;
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}
