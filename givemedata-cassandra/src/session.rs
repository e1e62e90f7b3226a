//! Session activation.
//!
//! A wide-column provider parses its descriptor eagerly but only opens a
//! session when it is first needed. [`Activation`] guarantees the session is
//! opened at most once per provider, however many callers race for it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use givemedata_core::tls::verification_context;
use scylla::execution_profile::ExecutionProfile;
use scylla::{Session, SessionBuilder};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{CassandraConfig, ClusterOptions};
use crate::error::CassandraResult;

/// At-most-once initialization of a value produced by an async connector.
///
/// A failed attempt leaves the cell empty so a later call can retry.
pub struct Activation<T> {
    cell: OnceCell<T>,
    attempts: AtomicUsize,
}

impl<T> Activation<T> {
    /// Create an empty activation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Return the value, running `connect` if no attempt has succeeded yet.
    ///
    /// Concurrent callers wait for the in-flight attempt instead of starting
    /// their own.
    pub async fn get_or_activate<F, Fut, E>(&self, connect: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell
            .get_or_try_init(|| {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                connect()
            })
            .await
    }

    /// The value, if activation already succeeded.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Check if activation already succeeded.
    pub fn is_active(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times the connector has been invoked.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<T> Default for Activation<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An open session bound to one provider's keyspace.
#[derive(Clone)]
pub struct CassandraSession {
    session: Arc<Session>,
    options: ClusterOptions,
}

impl CassandraSession {
    /// Get a reference to the underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Options the session was opened with.
    #[must_use]
    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Check if the session answers a trivial query.
    pub async fn is_healthy(&self) -> bool {
        self.session
            .query_unpaged("SELECT now() FROM system.local", &[])
            .await
            .is_ok()
    }
}

impl std::fmt::Debug for CassandraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassandraSession")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Open a session to the cluster described by `config`.
pub async fn connect(
    config: &CassandraConfig,
    options: &ClusterOptions,
) -> CassandraResult<CassandraSession> {
    let profile = ExecutionProfile::builder()
        .request_timeout(Some(options.request_timeout))
        .build();

    let mut builder = SessionBuilder::new()
        .known_nodes(config.known_nodes())
        .connection_timeout(options.connect_timeout)
        .user(config.username(), config.password())
        .use_keyspace(config.keyspace(), false)
        .default_execution_profile_handle(profile.into_handle());

    if let Some(cert) = config.certificate() {
        builder = builder.ssl_context(Some(verification_context(cert)?));
        debug!(cert = %cert.display(), "Cassandra session uses TLS");
    }

    let session = builder.build().await?;
    info!(
        nodes = ?config.known_nodes(),
        keyspace = %config.keyspace(),
        "Cassandra session opened"
    );

    Ok(CassandraSession {
        session: Arc::new(session),
        options: options.clone(),
    })
}
