//! PostgreSQL connection wrapper.

use deadpool_postgres::Object;
use givemedata_core::RowSet;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::debug;

use crate::error::PgResult;
use crate::row::to_rowset;

/// A pooled PostgreSQL connection.
///
/// The connection goes back to its pool when dropped.
#[derive(Debug)]
pub struct PgConnection {
    client: Object,
}

impl PgConnection {
    pub(crate) fn new(client: Object) -> Self {
        Self { client }
    }

    /// Run a catalog query through the per-connection statement cache.
    pub async fn query_cached(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> PgResult<Vec<Row>> {
        debug!(sql = %sql, "Executing cached query");
        let stmt = self.client.prepare_cached(sql).await?;
        Ok(self.client.query(&stmt, params).await?)
    }

    /// Run ad-hoc query text and collect every row.
    ///
    /// The statement is prepared unnamed and not cached, since ad-hoc text
    /// rarely repeats.
    pub async fn query_rowset(&self, sql: &str) -> PgResult<RowSet> {
        debug!(sql = %sql, "Executing query");
        let stmt = self.client.prepare(sql).await?;
        let rows = self.client.query(&stmt, &[]).await?;
        to_rowset(stmt.columns(), &rows)
    }

    /// Execute statements that return no rows, in a single round-trip.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "Executing batch");
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Get the underlying tokio-postgres client.
    ///
    /// This is useful for advanced operations not covered by this wrapper.
    pub fn inner(&self) -> &Object {
        &self.client
    }
}
