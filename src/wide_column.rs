//! Wide-column leaves backed by Cassandra.
//!
//! The descriptor is parsed when the tree is built, but the session opens
//! only on [`WideColumnProvider::activate_cluster`] or the first query.
//! Without the `cassandra` feature the leaf is still built and displayed,
//! and every operation fails with
//! [`GivemedataError::MissingOptionalDependency`].

use std::path::{Path, PathBuf};

use givemedata_core::{
    CassandraDescriptor, ClusterOptions, ColumnList, ConnectionDescriptor, GivemedataError,
    GivemedataResult, RowSet, TableList, TableScope,
};
use tracing::debug;

#[cfg(feature = "cassandra")]
use givemedata_cassandra::{CassandraConfig, CassandraEngine};

use crate::node::{NodeInfo, ProviderNode};
use crate::registry::LeafContext;

/// A leaf owning a lazily activated Cassandra session.
pub struct WideColumnProvider {
    info: NodeInfo,
    descriptor: CassandraDescriptor,
    certificate: Option<PathBuf>,
    #[cfg(feature = "cassandra")]
    engine: CassandraEngine,
}

impl WideColumnProvider {
    /// Build a wide-column leaf. No network I/O happens here.
    pub fn construct(leaf: LeafContext) -> GivemedataResult<ProviderNode> {
        let LeafContext {
            info,
            descriptor,
            certificate,
        } = leaf;
        let ConnectionDescriptor::WideColumn(descriptor) = descriptor else {
            return Err(GivemedataError::invalid_config(
                info.dotted_path(),
                "expected a cassandra connection string",
            ));
        };
        debug!(
            node = %info.dotted_path(),
            hosts = ?descriptor.hosts,
            tls = certificate.is_some(),
            "Wide-column provider armed"
        );

        #[cfg(feature = "cassandra")]
        let engine = {
            let mut config = CassandraConfig::from_descriptor(&descriptor);
            if let Some(cert) = &certificate {
                config = config.with_certificate(cert);
            }
            CassandraEngine::new(config)
        };

        Ok(ProviderNode::WideColumn(Self {
            info,
            descriptor,
            certificate,
            #[cfg(feature = "cassandra")]
            engine,
        }))
    }

    /// Shared node fields.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// The parsed connection string.
    pub fn descriptor(&self) -> &CassandraDescriptor {
        &self.descriptor
    }

    /// Certificate the session will verify the cluster against, if any.
    pub fn certificate(&self) -> Option<&Path> {
        self.certificate.as_deref()
    }

    /// The engine behind this leaf.
    #[cfg(feature = "cassandra")]
    pub fn engine(&self) -> &CassandraEngine {
        &self.engine
    }

    /// Check if the session is already open.
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "cassandra")]
        {
            self.engine.is_active()
        }
        #[cfg(not(feature = "cassandra"))]
        {
            false
        }
    }

    /// Open the session.
    ///
    /// Idempotent: once a session is open, later calls return immediately
    /// and concurrent first calls share one connection attempt.
    pub async fn activate_cluster(&self, options: &ClusterOptions) -> GivemedataResult<()> {
        options.validate()?;
        #[cfg(feature = "cassandra")]
        {
            self.engine.activate(options).await?;
            Ok(())
        }
        #[cfg(not(feature = "cassandra"))]
        {
            Err(missing_driver())
        }
    }

    /// Run raw CQL, activating with `options` first if needed.
    pub async fn run_cql(&self, cql: &str, options: &ClusterOptions) -> GivemedataResult<RowSet> {
        #[cfg(feature = "cassandra")]
        {
            self.engine.run_cql(cql, options).await
        }
        #[cfg(not(feature = "cassandra"))]
        {
            let _ = (cql, options);
            Err(missing_driver())
        }
    }

    /// Run CQL text, appending ` limit n` unless the text already mentions
    /// a limit anywhere (case-insensitive).
    pub async fn run_query(&self, query: &str, limit: Option<u64>) -> GivemedataResult<RowSet> {
        #[cfg(feature = "cassandra")]
        {
            self.engine.run_query(query, limit).await
        }
        #[cfg(not(feature = "cassandra"))]
        {
            let _ = (query, limit);
            Err(missing_driver())
        }
    }

    /// List tables of the session keyspace, or every `keyspace.table`.
    pub async fn list_tables(&self, scope: TableScope) -> GivemedataResult<TableList> {
        #[cfg(feature = "cassandra")]
        {
            self.engine.list_tables(scope).await
        }
        #[cfg(not(feature = "cassandra"))]
        {
            let _ = scope;
            Err(missing_driver())
        }
    }

    /// List column metadata of the session keyspace, or of every keyspace.
    pub async fn list_columns(&self, scope: TableScope) -> GivemedataResult<ColumnList> {
        #[cfg(feature = "cassandra")]
        {
            self.engine.list_columns(scope).await
        }
        #[cfg(not(feature = "cassandra"))]
        {
            let _ = scope;
            Err(missing_driver())
        }
    }

    /// Activate if needed and run a trivial query.
    pub async fn is_healthy(&self) -> bool {
        #[cfg(feature = "cassandra")]
        {
            self.engine.is_healthy().await
        }
        #[cfg(not(feature = "cassandra"))]
        {
            false
        }
    }
}

#[cfg(not(feature = "cassandra"))]
fn missing_driver() -> GivemedataError {
    GivemedataError::MissingOptionalDependency {
        feature: "cassandra",
    }
}

impl std::fmt::Debug for WideColumnProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WideColumnProvider")
            .field("info", &self.info)
            .field("descriptor", &self.descriptor)
            .field("certificate", &self.certificate)
            .field("active", &self.is_active())
            .finish()
    }
}
