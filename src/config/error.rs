//! Error types for configuration resolution.

use thiserror::Error;

/// Errors that stop the service before it dials the database.
///
/// Messages name the offending variable but never carry its value.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Required environment variable {variable} is not set")]
    Missing { variable: &'static str },

    /// The host is not a single valid server address, e.g. a bad port or a host list.
    #[error("Invalid host in {variable}: {host:?} ({reason})")]
    InvalidHost {
        variable: &'static str,
        host: String,
        reason: String,
    },
}
