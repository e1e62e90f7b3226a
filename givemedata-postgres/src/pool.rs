//! Connection pool for PostgreSQL.
//!
//! Creating a pool performs no I/O: connections are opened on first use, so
//! a provider tree with many relational leaves can be built without touching
//! the network. A certificate that cannot be loaded is reported by the
//! first [`PgPool::get`] rather than by pool creation.

use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use givemedata_core::tls::{self, TlsError};
use postgres_openssl::MakeTlsConnector;
use tokio_postgres::NoTls;
use tracing::{debug, info, warn};

use crate::config::{PgConfig, TlsMode};
use crate::connection::PgConnection;
use crate::error::{PgError, PgResult};

/// A connection pool for PostgreSQL.
#[derive(Clone)]
pub struct PgPool {
    inner: Pool,
    config: Arc<PgConfig>,
    tls_failure: Option<Arc<TlsError>>,
}

impl PgPool {
    /// Create a new connection pool from configuration.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        Self::with_pool_config(config, PoolConfig::default())
    }

    /// Create a new connection pool with custom pool configuration.
    pub fn with_pool_config(config: PgConfig, pool_config: PoolConfig) -> PgResult<Self> {
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pg_config = config.to_pg_config();
        let tls_mode = config.tls_mode();
        let connector = match &tls_mode {
            TlsMode::Disabled => None,
            TlsMode::Encrypted => Some(tls::encrypting_connector()),
            TlsMode::Verified(cert) => Some(tls::verified_connector(cert)),
        };

        let mut tls_failure = None;
        let mgr = match connector {
            None => Manager::from_config(pg_config, NoTls, mgr_config),
            Some(Ok(connector)) => {
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), mgr_config)
            }
            Some(Err(err)) => {
                warn!(
                    hosts = %config.hosts(),
                    error = %err,
                    "TLS connector unavailable, connections will fail"
                );
                tls_failure = Some(Arc::new(err));
                Manager::from_config(pg_config, NoTls, mgr_config)
            }
        };

        let pool = Pool::builder(mgr)
            .runtime(Runtime::Tokio1)
            .max_size(pool_config.max_connections)
            .wait_timeout(pool_config.connection_timeout)
            .create_timeout(Some(config.connect_timeout()))
            .recycle_timeout(pool_config.idle_timeout)
            .build()?;

        info!(
            hosts = %config.hosts(),
            database = ?config.database(),
            max_connections = %pool_config.max_connections,
            tls = ?tls_mode,
            "PostgreSQL connection pool created"
        );

        Ok(Self {
            inner: pool,
            config: Arc::new(config),
            tls_failure,
        })
    }

    /// Create a pool straight from a connection URL.
    pub fn from_url(url: &str) -> PgResult<Self> {
        Self::new(PgConfig::from_url(url)?)
    }

    /// Get a connection from the pool, opening one if none is idle.
    pub async fn get(&self) -> PgResult<PgConnection> {
        if let Some(err) = &self.tls_failure {
            return Err(PgError::Tls(err.clone()));
        }
        debug!("Acquiring connection from pool");
        let client = self.inner.get().await?;
        Ok(PgConnection::new(client))
    }

    /// Get the current pool status.
    pub fn status(&self) -> PoolStatus {
        let status = self.inner.status();
        PoolStatus {
            available: status.available as usize,
            size: status.size as usize,
            max_size: status.max_size as usize,
            waiting: status.waiting as usize,
        }
    }

    /// Get the pool configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Check if connections are made over TLS.
    pub fn uses_tls(&self) -> bool {
        self.config.tls_mode() != TlsMode::Disabled
    }

    /// Check that a connection can be acquired and answers a trivial query.
    pub async fn ping(&self) -> PgResult<()> {
        let conn = self.get().await?;
        conn.inner().simple_query("SELECT 1").await?;
        Ok(())
    }

    /// Check if the pool is healthy by attempting to get a connection.
    pub async fn is_healthy(&self) -> bool {
        self.ping().await.is_ok()
    }

    /// Close the pool and all connections.
    ///
    /// Every later [`get`](Self::get) fails.
    pub fn close(&self) {
        self.inner.close();
        info!("PostgreSQL connection pool closed");
    }

    /// Check if [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Pool status information.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    /// Number of available (idle) connections.
    pub available: usize,
    /// Current total size of the pool.
    pub size: usize,
    /// Maximum size of the pool.
    pub max_size: usize,
    /// Number of tasks waiting for a connection.
    pub waiting: usize,
}

/// Configuration for the connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: usize,
    /// Maximum time to wait for a free connection.
    pub connection_timeout: Option<Duration>,
    /// Maximum time to spend recycling an idle connection.
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 4,
            connection_timeout: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(5)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 4);
        assert!(config.connection_timeout.is_some());
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() {
        // Nothing listens on this port; creation must still succeed.
        let pool = PgPool::from_url("postgresql://u:p@127.0.0.1:1/db?connect_timeout=1").unwrap();
        let status = pool.status();
        assert_eq!(status.size, 0);
        assert_eq!(status.max_size, 4);
        assert_eq!(pool.config().database(), Some("db"));
    }

    #[tokio::test]
    async fn test_unreachable_pool_is_unhealthy() {
        let pool = PgPool::from_url("postgresql://u:p@127.0.0.1:1/db?connect_timeout=1").unwrap();
        assert!(!pool.is_healthy().await);
    }

    #[tokio::test]
    async fn test_custom_pool_config() {
        let config = PgConfig::from_url("postgresql://u:p@127.0.0.1:1/db").unwrap();
        let pool = PgPool::with_pool_config(
            config,
            PoolConfig {
                max_connections: 16,
                ..PoolConfig::default()
            },
        )
        .unwrap();
        assert_eq!(pool.status().max_size, 16);
    }

    #[tokio::test]
    async fn test_closed_pool_refuses_connections() {
        let pool = PgPool::from_url("postgresql://u:p@127.0.0.1:1/db?connect_timeout=1").unwrap();
        assert!(!pool.is_closed());

        pool.close();
        assert!(pool.is_closed());
        let err = pool.get().await.unwrap_err();
        assert!(matches!(err, PgError::Pool(_)));
    }

    #[tokio::test]
    async fn test_require_uses_tls_without_certificate() {
        let pool =
            PgPool::from_url("postgresql://u:p@127.0.0.1:1/db?sslmode=require&connect_timeout=1")
                .unwrap();
        assert!(pool.uses_tls());
        assert_eq!(pool.config().tls_mode(), TlsMode::Encrypted);

        // The connector was built, so the failure comes from the network.
        let err = pool.get().await.unwrap_err();
        assert!(!matches!(err, PgError::Tls(_)));
    }

    #[tokio::test]
    async fn test_malformed_certificate_fails_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("warehouse.givemedata.cer");
        std::fs::write(&cert, "not a certificate").unwrap();

        let config = PgConfig::from_url("postgresql://u:p@127.0.0.1:1/db")
            .unwrap()
            .with_certificate(&cert);
        let pool = PgPool::new(config).unwrap();
        assert!(pool.uses_tls());

        let err = pool.get().await.unwrap_err();
        assert!(matches!(err, PgError::Tls(_)));
        assert!(!pool.is_healthy().await);
    }
}
