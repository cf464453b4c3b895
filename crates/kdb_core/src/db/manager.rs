//! Connection provider for one SQLite database file.
//!
//! # Responsibility
//! - Run parameterized write statements with immediate commit.
//! - Run parameterized queries and hand back materialized results.
//! - Create `Table` handles bound to this provider.
//!
//! # Invariants
//! - No connection outlives the call that opened it, except the one handed
//!   out by `new_connection`.
//! - SQL text and bind parameters are logged before every statement.

use super::open::{open_db, ConnectionConfig};
use super::DbResult;
use crate::model::value::Value;
use crate::table::Table;
use log::debug;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};

/// Read/write contract a `Table` needs from its backing store.
pub trait Executor {
    /// Runs a data-modifying statement and commits it.
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<()>;
    /// Runs a query and returns every result record.
    fn select(&self, sql: &str, params: &[Value]) -> DbResult<ResultSet>;
}

/// Fully read query result: column names plus records in result order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Result column names as reported by the engine.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn first(&self) -> Option<&[Value]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = Vec<Value>;
    type IntoIter = std::vec::IntoIter<Vec<Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// SQLite connection provider bound to one database path.
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    path: PathBuf,
    config: ConnectionConfig,
}

impl DatabaseManager {
    /// Creates a provider using default connection settings.
    ///
    /// No connection is opened until the first statement runs.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_config(path, ConnectionConfig::default())
    }

    pub fn with_config(path: impl AsRef<Path>, config: ConnectionConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Opens a new connection the caller manages directly.
    pub fn new_connection(&self) -> DbResult<Connection> {
        open_db(&self.path, &self.config)
    }

    /// Creates a table handle without loading any data.
    pub fn table(&self, table_name: impl Into<String>) -> Table<'_, Self> {
        Table::new(self, table_name)
    }

    /// Creates a table handle and loads all of its rows.
    pub fn retrieve_table(&self, table_name: impl Into<String>) -> DbResult<Table<'_, Self>> {
        let mut table = self.table(table_name);
        table.retrieve()?;
        Ok(table)
    }
}

impl Executor for DatabaseManager {
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<()> {
        debug!(
            "event=db_execute module=db sql={} params={}",
            compact_sql(sql),
            format_params(params)
        );

        let conn = self.new_connection()?;
        conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    fn select(&self, sql: &str, params: &[Value]) -> DbResult<ResultSet> {
        debug!(
            "event=db_select module=db sql={} params={}",
            compact_sql(sql),
            format_params(params)
        );

        let conn = self.new_connection()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                values.push(row.get::<_, Value>(index)?);
            }
            records.push(values);
        }

        Ok(ResultSet::new(columns, records))
    }
}

/// Renders bind parameters as a SQL-literal list, e.g. `[1, 'name']`.
fn format_params(params: &[Value]) -> String {
    let rendered: Vec<String> = params.iter().map(Value::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{compact_sql, format_params, DatabaseManager, Executor};
    use crate::model::value::Value;

    fn manager_with_table() -> (tempfile::TempDir, DatabaseManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = DatabaseManager::new(dir.path().join("manager.db"));
        manager
            .execute(
                "CREATE TABLE test_table (id INTEGER PRIMARY KEY, name TEXT)",
                &[],
            )
            .unwrap();
        (dir, manager)
    }

    #[test]
    fn execute_commits_immediately() {
        let (_dir, manager) = manager_with_table();
        manager
            .execute(
                "INSERT INTO test_table (name) VALUES (?)",
                &[Value::from("Test User")],
            )
            .unwrap();

        let conn = manager.new_connection().unwrap();
        let name: String = conn
            .query_row("SELECT name FROM test_table WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "Test User");
    }

    #[test]
    fn select_returns_columns_and_rows() {
        let (_dir, manager) = manager_with_table();
        manager
            .execute(
                "INSERT INTO test_table (name) VALUES (?)",
                &[Value::from("Select Test")],
            )
            .unwrap();

        let result = manager
            .select(
                "SELECT id, name AS Label FROM test_table WHERE name = ?",
                &[Value::from("Select Test")],
            )
            .unwrap();

        assert_eq!(result.columns(), ["id".to_string(), "Label".to_string()]);
        assert_eq!(
            result.first(),
            Some(&[Value::Integer(1), Value::from("Select Test")][..])
        );
    }

    #[test]
    fn select_with_no_results_is_empty() {
        let (_dir, manager) = manager_with_table();
        let result = manager
            .select(
                "SELECT name FROM test_table WHERE name = ?",
                &[Value::from("NonExistentName")],
            )
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.first(), None);
        assert_eq!(result.columns(), ["name".to_string()]);
    }

    #[test]
    fn syntax_errors_surface_as_db_errors() {
        let (_dir, manager) = manager_with_table();
        assert!(manager.execute("INSERT INTO", &[]).is_err());
        assert!(manager.select("SELEC name FROM test_table", &[]).is_err());
    }

    #[test]
    fn params_and_sql_are_rendered_compactly() {
        assert_eq!(
            format_params(&[Value::from(1), Value::Null, Value::from("x")]),
            "[1, NULL, 'x']"
        );
        assert_eq!(
            compact_sql("\n  DELETE FROM t\n  WHERE (id = ?)\n"),
            "DELETE FROM t WHERE (id = ?)"
        );
    }
}
