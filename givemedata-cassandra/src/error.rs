//! Error types for Cassandra operations.

use givemedata_core::{GivemedataError, TlsError};
use scylla::transport::errors::{DbError, NewSessionError, QueryError};
use thiserror::Error;

/// Result type for Cassandra operations.
pub type CassandraResult<T> = Result<T, CassandraError>;

/// Errors that can occur during Cassandra operations.
#[derive(Error, Debug)]
pub enum CassandraError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session could not be opened.
    #[error("Connection error: {0}")]
    Connection(#[from] NewSessionError),

    /// Query execution error.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// The certificate could not be turned into a verification context.
    #[error("{0}")]
    Tls(#[from] TlsError),
}

impl CassandraError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if error is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Query(QueryError::TimeoutError)
                | Self::Query(QueryError::DbError(
                    DbError::ReadTimeout { .. } | DbError::WriteTimeout { .. },
                    _
                ))
        )
    }

    /// Check if error is authentication related.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Query(QueryError::DbError(
                DbError::AuthenticationError | DbError::Unauthorized,
                _
            ))
        )
    }
}

impl From<CassandraError> for GivemedataError {
    fn from(err: CassandraError) -> Self {
        GivemedataError::driver("cassandra", err)
    }
}
