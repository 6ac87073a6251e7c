//! Error types for the Order repository.

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur during order operations.
///
/// Every variant keeps the underlying [`StoreError`] (and with it the driver's
/// message) unchanged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// No session could be borrowed from the pool.
    #[error("Order store unavailable: {0}")]
    Unavailable(#[source] StoreError),

    /// The insert was rejected or did not complete.
    #[error("Problem inserting order: {0}")]
    InsertFailed(#[source] StoreError),

    /// The count query failed.
    #[error("Problem querying number of orders: {0}")]
    CountFailed(#[source] StoreError),

    /// The order could not be converted to a document.
    #[error("Order encoding error: {0}")]
    Encoding(#[source] StoreError),
}

impl OrderError {
    /// The store-level cause.
    pub fn store_error(&self) -> &StoreError {
        match self {
            OrderError::Unavailable(e)
            | OrderError::InsertFailed(e)
            | OrderError::CountFailed(e)
            | OrderError::Encoding(e) => e,
        }
    }
}
