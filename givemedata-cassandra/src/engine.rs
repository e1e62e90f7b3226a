//! Exploration operations over a lazily activated Cassandra session.

use futures::TryStreamExt;
use givemedata_core::sql::apply_limit;
use givemedata_core::{ColumnInfo, ColumnList, GivemedataResult, RowSet, TableList, TableScope};
use scylla::frame::response::result::Row;
use scylla::query::Query;
use scylla::serialize::row::SerializeRow;
use tracing::debug;

use crate::config::{CassandraConfig, ClusterOptions};
use crate::error::{CassandraError, CassandraResult};
use crate::row::row_to_json;
use crate::session::{Activation, CassandraSession, connect};

const KEYSPACE_TABLES: &str = "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?";

const ALL_TABLES: &str = "SELECT keyspace_name, table_name FROM system_schema.tables";

const KEYSPACE_COLUMNS: &str = "SELECT table_name, column_name, type, kind \
    FROM system_schema.columns WHERE keyspace_name = ?";

const ALL_COLUMNS: &str =
    "SELECT keyspace_name, table_name, column_name, type, kind FROM system_schema.columns";

/// Cassandra engine behind a wide-column provider.
///
/// Construction performs no I/O. The session is opened by
/// [`activate`](Self::activate) or by the first query, and reused after that.
pub struct CassandraEngine {
    config: CassandraConfig,
    session: Activation<CassandraSession>,
}

impl CassandraEngine {
    /// Create an engine; no connection is made.
    #[must_use]
    pub fn new(config: CassandraConfig) -> Self {
        Self {
            config,
            session: Activation::new(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &CassandraConfig {
        &self.config
    }

    /// Check if the session is already open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Open the session if it is not open yet.
    ///
    /// Calling this more than once is harmless: later calls return the
    /// existing session and their `options` are ignored.
    pub async fn activate(&self, options: &ClusterOptions) -> CassandraResult<&CassandraSession> {
        options
            .validate()
            .map_err(|e| CassandraError::config(e.to_string()))?;
        let session = self
            .session
            .get_or_activate(|| connect(&self.config, options))
            .await?;
        if session.options() != options {
            debug!("Cassandra session already active, ignoring new cluster options");
        }
        Ok(session)
    }

    /// Run raw CQL, activating with `options` first if needed.
    ///
    /// Every page is fetched; `options.page_size` controls the page size and
    /// must be at least 1.
    pub async fn run_cql(&self, cql: &str, options: &ClusterOptions) -> GivemedataResult<RowSet> {
        options.validate()?;
        Ok(self.fetch_all(cql, (), options).await?)
    }

    /// Run CQL text, appending ` limit n` first unless the text mentions a limit.
    pub async fn run_query(&self, query: &str, limit: Option<u64>) -> GivemedataResult<RowSet> {
        let query = apply_limit(query, limit);
        self.run_cql(&query, &ClusterOptions::default()).await
    }

    /// List tables: the session keyspace's tables, or every `keyspace.table`.
    pub async fn list_tables(&self, scope: TableScope) -> GivemedataResult<TableList> {
        let options = ClusterOptions::default();
        let rows = match scope {
            TableScope::Public => {
                self.fetch_all(KEYSPACE_TABLES, (self.config.keyspace(),), &options)
                    .await?
            }
            TableScope::All => self.fetch_all(ALL_TABLES, (), &options).await?,
        };

        let mut names: Vec<String> = rows
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|cell| cell.as_str())
                    .collect::<Vec<_>>()
                    .join(".")
            })
            .collect();
        names.sort();
        Ok(TableList::new(names))
    }

    /// List column metadata for the session keyspace, or for every keyspace.
    ///
    /// Partition and clustering key columns are reported as not nullable.
    pub async fn list_columns(&self, scope: TableScope) -> GivemedataResult<ColumnList> {
        let options = ClusterOptions::default();
        let rows = match scope {
            TableScope::Public => {
                self.fetch_all(KEYSPACE_COLUMNS, (self.config.keyspace(),), &options)
                    .await?
            }
            TableScope::All => self.fetch_all(ALL_COLUMNS, (), &options).await?,
        };

        let text = |row: &[serde_json::Value], name: &str| -> String {
            rows.column_index(name)
                .and_then(|i| row.get(i))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let mut columns: Vec<ColumnInfo> = rows
            .rows
            .iter()
            .map(|row| {
                let row = row.as_slice();
                let table = text(row, "table_name");
                let table_name = match scope {
                    TableScope::Public => table,
                    TableScope::All => format!("{}.{table}", text(row, "keyspace_name")),
                };
                let kind = text(row, "kind");
                ColumnInfo {
                    column_name: text(row, "column_name"),
                    table_name,
                    data_type: text(row, "type"),
                    is_nullable: kind == "regular" || kind == "static",
                }
            })
            .collect();
        columns.sort_by(|a, b| {
            (&a.table_name, &a.column_name).cmp(&(&b.table_name, &b.column_name))
        });
        Ok(ColumnList::new(columns))
    }

    /// Activate if needed and run a trivial query.
    pub async fn is_healthy(&self) -> bool {
        match self.activate(&ClusterOptions::default()).await {
            Ok(session) => session.is_healthy().await,
            Err(_) => false,
        }
    }

    async fn fetch_all(
        &self,
        cql: &str,
        values: impl SerializeRow,
        options: &ClusterOptions,
    ) -> CassandraResult<RowSet> {
        let session = self.activate(options).await?;
        debug!(cql = %cql, page_size = options.page_size, "Executing CQL");

        let query = Query::new(cql).with_page_size(options.page_size);
        let pages = session.session().query_iter(query, values).await?;
        let columns: Vec<String> = pages
            .get_column_specs()
            .iter()
            .map(|spec| spec.name.clone())
            .collect();
        let rows: Vec<Row> = pages.try_collect().await?;

        Ok(RowSet::new(columns, rows.iter().map(row_to_json).collect()))
    }
}

impl std::fmt::Debug for CassandraEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassandraEngine")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use givemedata_core::{CassandraDescriptor, GivemedataError};
    use std::time::Duration;

    fn unreachable_engine() -> CassandraEngine {
        let descriptor = CassandraDescriptor::parse("cassandra://u:p@127.0.0.1:1/ks").unwrap();
        CassandraEngine::new(CassandraConfig::from_descriptor(&descriptor))
    }

    #[test]
    fn test_construction_is_lazy() {
        let engine = unreachable_engine();
        assert!(!engine.is_active());
        assert_eq!(engine.config().keyspace(), "ks");
    }

    #[tokio::test]
    async fn test_unreachable_cluster_reports_driver_error() {
        let engine = unreachable_engine();
        let options = ClusterOptions::default().connect_timeout(Duration::from_millis(200));

        let err = engine.run_cql("SELECT * FROM t", &options).await.unwrap_err();
        assert!(matches!(err, GivemedataError::Driver { family: "cassandra", .. }));
        assert!(!engine.is_active());
    }

    #[tokio::test]
    async fn test_non_positive_page_size_is_rejected() {
        let engine = unreachable_engine();

        for page_size in [0, -5] {
            let options = ClusterOptions::default().page_size(page_size);

            let err = engine.run_cql("SELECT * FROM t", &options).await.unwrap_err();
            assert!(matches!(err, GivemedataError::InvalidConfig { .. }));

            let err = engine.activate(&options).await.unwrap_err();
            assert!(matches!(err, CassandraError::Configuration(_)));
        }
        assert!(!engine.is_active());
    }
}
