//! Error types for PostgreSQL operations.

use std::sync::Arc;

use givemedata_core::{GivemedataError, TlsError};
use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Pool could not be built.
    #[error("failed to create pool: {0}")]
    Build(#[from] deadpool_postgres::BuildError),

    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The TLS connector could not be built; shared by every request.
    #[error("TLS setup failed: {0}")]
    Tls(#[source] Arc<TlsError>),

    /// A cell could not be converted to a JSON value.
    #[error("cannot convert column `{column}`: {message}")]
    Conversion { column: String, message: String },
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Postgres(e) => e.is_closed() || e.code().is_none(),
            _ => false,
        }
    }

    /// SQLSTATE code reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(|c| c.code()),
            _ => None,
        }
    }
}

impl From<PgError> for GivemedataError {
    fn from(err: PgError) -> Self {
        GivemedataError::driver("postgres", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));
        assert!(!err.is_connection_error());
        assert!(err.sql_state().is_none());
    }

    #[test]
    fn test_into_givemedata_error() {
        let err: GivemedataError = PgError::config("bad sslmode").into();
        assert!(matches!(err, GivemedataError::Driver { family: "postgres", .. }));
        assert!(err.to_string().contains("bad sslmode"));
        assert!(err.driver_error::<PgError>().is_some());
    }
}
