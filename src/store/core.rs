//! # Core Store Abstractions
//!
//! This module defines the seam between the order logic and the document database.
//!
//! ## Key Types
//!
//! - [`SessionPool`]: Anything that can hand out short-lived sessions (the MongoDB
//!   [`ConnectionManager`](crate::store::ConnectionManager), or a test double).
//! - [`StoreSession`]: One borrowed session. Released when dropped.
//! - [`Namespace`]: A `database.collection` pair.
//! - [`StoreError`]: Low-level failures, classified just enough for callers to log them.

use async_trait::async_trait;
use mongodb::bson::Document;
use std::fmt;

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// A pool of database sessions.
///
/// # Architecture Note
/// The repository and the schema initializer are generic over this trait, so the
/// same code runs against MongoDB in production and against
/// [`MemoryPool`](crate::store::memory::MemoryPool) in tests. Implementations are
/// cheap handles (`Clone`) over shared pool state; every clone borrows from the
/// same underlying pool.
///
/// # Session Ownership
/// [`borrow_session`](SessionPool::borrow_session) returns an owned session. The
/// caller holds it exclusively for one operation and returns it to the pool by
/// dropping it, which also covers early returns through `?`.
#[async_trait]
pub trait SessionPool: Clone + Send + Sync + 'static {
    /// The session type handed out by this pool.
    type Session: StoreSession + 'static;

    /// Checks out a fresh session from the pool.
    async fn borrow_session(&self) -> Result<Self::Session, StoreError>;

    /// Releases the pool's resources. Borrowing after `close` is undefined.
    async fn close(&self) {}

    /// Short human-readable label used in log lines (never contains credentials).
    fn describe(&self) -> String;
}

/// A single borrowed session.
#[async_trait]
pub trait StoreSession: Send {
    /// Inserts one document into `namespace`.
    async fn insert_one(&mut self, namespace: &Namespace, document: Document) -> Result<(), StoreError>;

    /// Counts every document in `namespace`.
    async fn count_documents(&mut self, namespace: &Namespace) -> Result<u64, StoreError>;

    /// Runs a database command against `database` and returns the server reply.
    async fn run_command(&mut self, database: &str, command: Document) -> Result<Document, StoreError>;

    /// Switches write acknowledgment for this session only.
    ///
    /// With `false`, writes and commands are fire-and-forget: they run with
    /// `w: 0` and do not wait for the server to confirm durability.
    fn set_acknowledged(&mut self, acknowledged: bool);
}

// =============================================================================
// 2. NAMESPACES & ERRORS
// =============================================================================

/// A `database.collection` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Errors raised by the store layer.
///
/// Driver errors are not modelled in detail; they are sorted into a handful of
/// buckets and keep the driver's message verbatim.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// No server could be reached (server selection or network failure).
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// The server rejected a command or write.
    #[error("Command rejected ({code}): {message}")]
    CommandRejected { code: i32, message: String },

    /// A value could not be converted to or from BSON.
    #[error("Document encoding error: {0}")]
    Encoding(String),

    /// Any other driver failure (authentication, TLS, protocol).
    #[error("Driver error: {0}")]
    Driver(String),
}

impl StoreError {
    /// Server error code, if the server produced one.
    pub fn code(&self) -> Option<i32> {
        match self {
            StoreError::CommandRejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        StoreError::Encoding(e.to_string())
    }
}
