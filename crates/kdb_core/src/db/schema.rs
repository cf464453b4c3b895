//! Table metadata introspection via `PRAGMA table_info`.
//!
//! # Invariants
//! - Columns are reported in engine order (`cid` ascending).
//! - Metadata is read fresh on every call; nothing is cached here.

use super::{DbResult, Executor};
use crate::model::value::Value;

/// One column description as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Value,
    /// 1-based position inside the primary key, 0 when not part of it.
    pub primary_key: i64,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.primary_key != 0
    }

    fn from_record(record: Vec<Value>) -> Self {
        let mut fields = record.into_iter();
        let mut next = || fields.next().unwrap_or_default();

        let cid = next().as_i64().unwrap_or_default();
        let name = text_or_empty(next());
        let declared_type = text_or_empty(next());
        let not_null = next().as_i64().unwrap_or_default() != 0;
        let default_value = next();
        let primary_key = next().as_i64().unwrap_or_default();

        Self {
            cid,
            name,
            declared_type,
            not_null,
            default_value,
            primary_key,
        }
    }
}

/// Reads the column metadata of `table_name`.
///
/// Unknown tables yield an empty list, matching engine behavior.
pub fn table_info<E: Executor + ?Sized>(
    executor: &E,
    table_name: &str,
) -> DbResult<Vec<ColumnInfo>> {
    let result = executor.select(&format!("PRAGMA table_info({table_name})"), &[])?;
    Ok(result.into_iter().map(ColumnInfo::from_record).collect())
}

/// Returns the primary-key column names of `table_name` in engine order.
pub fn primary_key_columns<E: Executor + ?Sized>(
    executor: &E,
    table_name: &str,
) -> DbResult<Vec<String>> {
    Ok(table_info(executor, table_name)?
        .into_iter()
        .filter(ColumnInfo::is_primary_key)
        .map(|column| column.name)
        .collect())
}

fn text_or_empty(value: Value) -> String {
    match value {
        Value::Text(text) => text,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{primary_key_columns, table_info};
    use crate::db::{DatabaseManager, Executor};
    use crate::model::value::Value;

    #[test]
    fn table_info_decodes_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DatabaseManager::new(dir.path().join("schema.db"));
        manager
            .execute(
                "CREATE TABLE items (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL DEFAULT 'unnamed',
                    price REAL
                )",
                &[],
            )
            .unwrap();

        let columns = table_info(&manager, "items").unwrap();
        assert_eq!(columns.len(), 3);

        assert_eq!(columns[0].cid, 0);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].declared_type, "INTEGER");
        assert!(columns[0].is_primary_key());

        assert_eq!(columns[1].name, "name");
        assert!(columns[1].not_null);
        assert_eq!(columns[1].default_value, Value::from("'unnamed'"));
        assert!(!columns[1].is_primary_key());

        assert_eq!(columns[2].default_value, Value::Null);
    }

    #[test]
    fn composite_keys_follow_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DatabaseManager::new(dir.path().join("schema.db"));
        manager
            .execute(
                "CREATE TABLE links (
                    target TEXT,
                    note TEXT,
                    source TEXT,
                    PRIMARY KEY (source, target)
                )",
                &[],
            )
            .unwrap();

        assert_eq!(
            primary_key_columns(&manager, "links").unwrap(),
            vec!["target".to_string(), "source".to_string()]
        );
    }

    #[test]
    fn unknown_table_has_no_primary_key() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DatabaseManager::new(dir.path().join("schema.db"));

        assert!(primary_key_columns(&manager, "missing").unwrap().is_empty());
    }
}
