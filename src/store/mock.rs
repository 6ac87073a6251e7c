//! # Mock Store
//!
//! Utilities for testing the repository against scripted store responses.
//!
//! Use [`MockPool::new`] to get a pool, then queue the responses the store should
//! produce with helpers like [`MockPool::expect_borrow`] or
//! [`MockPool::expect_insert`]. Calls consume expectations in order; a call that
//! does not match the next expectation panics.
//!
//! # Example
//! ```ignore
//! let mock = MockPool::new();
//! mock.expect_borrow().return_ok(());
//! mock.expect_insert().return_err(StoreError::Unreachable("down".into()));
//!
//! let repository = OrderRepository::new(mock.clone(), namespace);
//! assert!(repository.create_order(params).await.is_err());
//! mock.verify(); // Ensures all expectations were met
//! ```

use crate::store::{Namespace, SessionPool, StoreError, StoreSession};
use async_trait::async_trait;
use mongodb::bson::Document;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Represents an expected call to the mock store and the response to give.
#[derive(Debug)]
enum Expectation {
    Borrow(Result<(), StoreError>),
    Insert(Result<(), StoreError>),
    Count(Result<u64, StoreError>),
    Command(Result<Document, StoreError>),
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

/// A scripted [`SessionPool`] with expectation tracking.
#[derive(Clone, Default)]
pub struct MockPool {
    expectations: Expectations,
    inserted: Arc<Mutex<Vec<Document>>>,
    acknowledged_flags: Arc<Mutex<Vec<bool>>>,
}

impl MockPool {
    /// Creates a new mock pool with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a session to be borrowed.
    pub fn expect_borrow(&self) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::Borrow)
    }

    /// Expects an `insert_one` call.
    pub fn expect_insert(&self) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::Insert)
    }

    /// Expects a `count_documents` call.
    pub fn expect_count(&self) -> ExpectationBuilder<u64> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::Count)
    }

    /// Expects a `run_command` call.
    pub fn expect_command(&self) -> ExpectationBuilder<Document> {
        ExpectationBuilder::new(self.expectations.clone(), Expectation::Command)
    }

    /// Documents passed to successful `insert_one` calls.
    pub fn inserted(&self) -> Vec<Document> {
        self.inserted.lock().unwrap().clone()
    }

    /// The acknowledgment mode each `run_command` call ran under.
    pub fn command_acknowledgments(&self) -> Vec<bool> {
        self.acknowledged_flags.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining: {:?}", exps.len(), exps);
        }
    }

    fn next(&self) -> Expectation {
        self.expectations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("Unexpected call: no expectations left"))
    }
}

/// Builder that queues one expectation.
pub struct ExpectationBuilder<T> {
    expectations: Expectations,
    wrap: fn(Result<T, StoreError>) -> Expectation,
}

impl<T> ExpectationBuilder<T> {
    fn new(expectations: Expectations, wrap: fn(Result<T, StoreError>) -> Expectation) -> Self {
        Self { expectations, wrap }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.expectations.lock().unwrap().push_back((self.wrap)(Ok(value)));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: StoreError) {
        self.expectations.lock().unwrap().push_back((self.wrap)(Err(error)));
    }
}

// =============================================================================
// POOL & SESSION
// =============================================================================

#[async_trait]
impl SessionPool for MockPool {
    type Session = MockSession;

    async fn borrow_session(&self) -> Result<MockSession, StoreError> {
        match self.next() {
            Expectation::Borrow(response) => response.map(|()| MockSession {
                pool: self.clone(),
                acknowledged: true,
            }),
            other => panic!("Unexpected borrow_session; next expectation is {:?}", other),
        }
    }

    fn describe(&self) -> String {
        "mock store".to_string()
    }
}

/// Session handed out by [`MockPool`].
pub struct MockSession {
    pool: MockPool,
    acknowledged: bool,
}

#[async_trait]
impl StoreSession for MockSession {
    async fn insert_one(&mut self, _namespace: &Namespace, document: Document) -> Result<(), StoreError> {
        match self.pool.next() {
            Expectation::Insert(response) => {
                if response.is_ok() {
                    self.pool.inserted.lock().unwrap().push(document);
                }
                response
            }
            other => panic!("Unexpected insert_one; next expectation is {:?}", other),
        }
    }

    async fn count_documents(&mut self, _namespace: &Namespace) -> Result<u64, StoreError> {
        match self.pool.next() {
            Expectation::Count(response) => response,
            other => panic!("Unexpected count_documents; next expectation is {:?}", other),
        }
    }

    async fn run_command(&mut self, _database: &str, _command: Document) -> Result<Document, StoreError> {
        self.pool.acknowledged_flags.lock().unwrap().push(self.acknowledged);
        match self.pool.next() {
            Expectation::Command(response) => response,
            other => panic!("Unexpected run_command; next expectation is {:?}", other),
        }
    }

    fn set_acknowledged(&mut self, acknowledged: bool) {
        self.acknowledged = acknowledged;
    }
}
