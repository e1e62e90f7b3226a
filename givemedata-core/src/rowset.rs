//! Driver-neutral query results.
//!
//! Every provider family returns the same shapes: a [`RowSet`] for ad-hoc
//! queries, a [`TableList`] for table listings and a [`ColumnList`] for
//! column metadata. Cells are carried as [`serde_json::Value`] so results
//! from different databases can be compared, printed or cached the same way.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GivemedataError, GivemedataResult};

/// Column names plus row-major cell values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// One entry per row; each row has one cell per column.
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Create a row set.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, by name.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(idx)))
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for RowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(cell_text).collect();
            writeln!(f, "{}", cells.join(" | "))?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Which tables a listing covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableScope {
    /// Only user tables in the default namespace (`public` schema, or the
    /// session keyspace for wide-column stores).
    #[default]
    Public,
    /// Every table visible to the connection, system catalogs included.
    All,
}

/// A table addressed either by position in the full listing or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
    /// Position in [`TableList::names`].
    Index(usize),
    /// Table name as listed.
    Name(String),
}

impl From<usize> for TableRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

/// Ordered list of table names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableList {
    names: Vec<String>,
}

impl TableList {
    /// Wrap a list of table names.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Table names in listing order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no tables were listed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check if a table with exactly this name is listed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Tables whose name contains `term`.
    ///
    /// The term is lower-cased before matching; table names are matched as
    /// stored.
    pub fn search(&self, term: &str) -> TableList {
        let term = term.to_lowercase();
        TableList::new(
            self.names
                .iter()
                .filter(|n| n.contains(&term))
                .cloned()
                .collect(),
        )
    }

    /// Resolve a table reference against this listing.
    pub fn resolve(&self, table: &TableRef) -> GivemedataResult<&str> {
        let found = match table {
            TableRef::Index(i) => self.names.get(*i),
            TableRef::Name(name) => self.names.iter().find(|n| *n == name),
        };
        found.map(String::as_str).ok_or_else(|| GivemedataError::TableNotFound {
            table: table.to_string(),
        })
    }
}

impl IntoIterator for TableList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl fmt::Display for TableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            writeln!(f, "{i:>4}  {name}")?;
        }
        Ok(())
    }
}

/// Metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub table_name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Ordered list of column metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnList {
    columns: Vec<ColumnInfo>,
}

impl ColumnList {
    /// Wrap a list of column metadata.
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    /// Column metadata in listing order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if no columns were listed.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns whose name contains `term` (lower-cased before matching).
    pub fn search(&self, term: &str) -> ColumnList {
        let term = term.to_lowercase();
        self.filtered(|c| c.column_name.contains(&term))
    }

    /// Columns belonging to `table`.
    pub fn for_table(&self, table: &str) -> ColumnList {
        self.filtered(|c| c.table_name == table)
    }

    fn filtered(&self, keep: impl Fn(&ColumnInfo) -> bool) -> ColumnList {
        ColumnList::new(self.columns.iter().filter(|c| keep(c)).cloned().collect())
    }
}

impl IntoIterator for ColumnList {
    type Item = ColumnInfo;
    type IntoIter = std::vec::IntoIter<ColumnInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tables() -> TableList {
        TableList::new(vec![
            "orders".into(),
            "order_items".into(),
            "users".into(),
        ])
    }

    fn column(name: &str, table: &str) -> ColumnInfo {
        ColumnInfo {
            column_name: name.into(),
            table_name: table.into(),
            data_type: "text".into(),
            is_nullable: true,
        }
    }

    #[test]
    fn test_table_search_lowercases_term() {
        let found = tables().search("ORDER");
        assert_eq!(found.names(), &["orders".to_string(), "order_items".to_string()]);
        assert!(tables().search("nothing").is_empty());
    }

    #[test]
    fn test_table_resolve() {
        let list = tables();
        assert_eq!(list.resolve(&TableRef::from(2)).unwrap(), "users");
        assert_eq!(list.resolve(&TableRef::from("orders")).unwrap(), "orders");

        let err = list.resolve(&TableRef::from(7)).unwrap_err();
        assert!(matches!(err, GivemedataError::TableNotFound { table } if table == "#7"));

        let err = list.resolve(&TableRef::from("missing")).unwrap_err();
        assert!(matches!(err, GivemedataError::TableNotFound { table } if table == "missing"));
    }

    #[test]
    fn test_column_filters() {
        let list = ColumnList::new(vec![
            column("user_id", "orders"),
            column("total", "orders"),
            column("id", "users"),
        ]);

        let ids: Vec<String> = list.search("ID").into_iter().map(|c| c.column_name).collect();
        assert_eq!(ids, vec!["user_id", "id"]);
        assert_eq!(list.for_table("orders").len(), 2);
    }

    #[test]
    fn test_rowset_accessors() {
        let rows = RowSet::new(
            vec!["id".into(), "name".into()],
            vec![vec![json!(1), json!("a")], vec![json!(2), Value::Null]],
        );

        assert_eq!(rows.len(), 2);
        let names: Vec<&Value> = rows.column("name").unwrap().collect();
        assert_eq!(names, vec![&json!("a"), &Value::Null]);
        assert!(rows.column("missing").is_none());

        let records = rows.to_records();
        assert_eq!(records[0]["id"], json!(1));

        let text = rows.to_string();
        assert!(text.starts_with("id | name\n"));
        assert!(text.contains("2 | NULL"));
        assert!(text.ends_with("(2 rows)"));
    }
}
