//! Exploration operations over a PostgreSQL pool.

use givemedata_core::sql::{DEFAULT_SAMPLE_LIMIT, apply_limit, sample_query};
use givemedata_core::{
    ColumnInfo, ColumnList, GivemedataError, GivemedataResult, RowSet, TableList, TableRef,
    TableScope,
};
use tokio_postgres::Row;
use tracing::debug;

use crate::connection::PgConnection;
use crate::error::{PgError, PgResult};
use crate::pool::PgPool;

const PUBLIC_TABLES: &str = "\
    SELECT table_name::text FROM information_schema.tables \
    WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
    ORDER BY table_name";

const ALL_TABLES: &str = "\
    SELECT (table_schema || '.' || table_name)::text FROM information_schema.tables \
    ORDER BY table_schema, table_name";

const PUBLIC_COLUMNS: &str = "\
    SELECT column_name::text, table_name::text, data_type::text, is_nullable::text \
    FROM information_schema.columns WHERE table_schema = 'public' \
    ORDER BY table_name, ordinal_position";

const ALL_COLUMNS: &str = "\
    SELECT column_name::text, (table_schema || '.' || table_name)::text, data_type::text, \
    is_nullable::text FROM information_schema.columns \
    ORDER BY table_schema, table_name, ordinal_position";

const TABLE_COLUMNS: &str = "\
    SELECT column_name::text, table_name::text, data_type::text, is_nullable::text \
    FROM information_schema.columns WHERE table_schema = 'public' AND table_name = $1 \
    ORDER BY ordinal_position";

/// PostgreSQL engine behind a relational provider.
#[derive(Clone)]
pub struct PgEngine {
    pool: PgPool,
}

impl PgEngine {
    /// Create a new PostgreSQL engine with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Borrow a pooled connection for work not covered by the engine.
    pub async fn connection(&self) -> GivemedataResult<PgConnection> {
        Ok(self.pool.get().await?)
    }

    /// Run query text, appending ` limit n` first unless the text mentions a limit.
    pub async fn run_query(&self, query: &str, limit: Option<u64>) -> GivemedataResult<RowSet> {
        let query = apply_limit(query, limit);
        let conn = self.pool.get().await?;
        Ok(conn.query_rowset(&query).await?)
    }

    /// List table names.
    pub async fn list_tables(&self, scope: TableScope) -> GivemedataResult<TableList> {
        let sql = match scope {
            TableScope::Public => PUBLIC_TABLES,
            TableScope::All => ALL_TABLES,
        };
        let rows = self.catalog(sql, &[]).await?;
        let names = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PgError::from)?;
        Ok(TableList::new(names))
    }

    /// List column metadata.
    pub async fn list_columns(&self, scope: TableScope) -> GivemedataResult<ColumnList> {
        let sql = match scope {
            TableScope::Public => PUBLIC_COLUMNS,
            TableScope::All => ALL_COLUMNS,
        };
        let rows = self.catalog(sql, &[]).await?;
        Ok(ColumnList::new(column_infos(&rows)?))
    }

    /// Column metadata of one public table.
    pub async fn describe(&self, table: &str) -> GivemedataResult<ColumnList> {
        let rows = self.catalog(TABLE_COLUMNS, &[&table]).await?;
        if rows.is_empty() {
            return Err(GivemedataError::TableNotFound {
                table: table.to_string(),
            });
        }
        Ok(ColumnList::new(column_infos(&rows)?))
    }

    /// First rows of a public table, addressed by name or by its position
    /// in [`list_tables`](Self::list_tables).
    pub async fn sample(
        &self,
        table: impl Into<TableRef>,
        limit: Option<u64>,
    ) -> GivemedataResult<RowSet> {
        let table = table.into();
        let tables = self.list_tables(TableScope::Public).await?;
        let name = tables.resolve(&table)?;
        let sql = sample_query(name, limit.unwrap_or(DEFAULT_SAMPLE_LIMIT));
        debug!(table = %name, "Sampling table");

        let conn = self.pool.get().await?;
        Ok(conn.query_rowset(&sql).await?)
    }

    /// Check if the database answers a trivial query.
    pub async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }

    /// Open a connection and run a trivial query, reporting the failure.
    pub async fn ping(&self) -> GivemedataResult<()> {
        Ok(self.pool.ping().await?)
    }

    async fn catalog(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> PgResult<Vec<Row>> {
        let conn = self.pool.get().await?;
        conn.query_cached(sql, params).await
    }
}

fn column_infos(rows: &[Row]) -> PgResult<Vec<ColumnInfo>> {
    rows.iter()
        .map(|row| -> PgResult<ColumnInfo> {
            Ok(ColumnInfo {
                column_name: row.try_get(0)?,
                table_name: row.try_get(1)?,
                data_type: row.try_get(2)?,
                is_nullable: row.try_get::<_, String>(3)? == "YES",
            })
        })
        .collect()
}
