//! SQL statement builders for table retrieval and reconciliation.
//!
//! # Responsibility
//! - Assemble SELECT/DELETE/UPDATE/INSERT text with positional placeholders.
//! - Collect bind values in placeholder order.
//!
//! # Invariants
//! - Only values are parameterized; table names, column names and caller
//!   clause fragments are spliced in verbatim.
//! - NULL key values are matched with `IS NULL` and bind nothing.

use crate::model::row::Row;
use crate::model::value::Value;

/// SQL text plus its positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// `SELECT * FROM <table> [WHERE <clause>] [ORDER BY <clause>]`.
pub fn select_statement(
    table_name: &str,
    where_clause: Option<&str>,
    where_params: &[Value],
    order_by_clause: Option<&str>,
) -> Statement {
    let mut sql = format!("SELECT * FROM {table_name}");
    let mut params = Vec::new();

    if let Some(clause) = where_clause {
        sql.push_str(&format!(" WHERE {clause}"));
        params.extend_from_slice(where_params);
    }

    if let Some(clause) = order_by_clause {
        sql.push_str(&format!(" ORDER BY {clause}"));
    }

    Statement { sql, params }
}

/// One DELETE matching every row in `rows` by key.
///
/// Rows are matched on `pk_columns`; without key columns every applied data
/// column of a persisted row is used instead, and never-inserted rows are
/// skipped. Returns `None` when no row yields a predicate.
pub fn delete_statement(
    table_name: &str,
    pk_columns: &[String],
    rows: &[Row],
) -> Option<Statement> {
    let mut predicates = Vec::with_capacity(rows.len());
    let mut params = Vec::new();

    for row in rows {
        let mut conditions = Vec::new();

        let mut push_condition = |column: &str, value: Option<&Value>| match value {
            Some(value) if !value.is_null() => {
                conditions.push(format!("{column} = ?"));
                params.push(value.clone());
            }
            _ => conditions.push(format!("{column} IS NULL")),
        };

        if pk_columns.is_empty() {
            if row.is_new() {
                continue;
            }
            for (column, value) in row.to_representation().iter() {
                push_condition(column, Some(value));
            }
        } else {
            for column in pk_columns {
                push_condition(column.as_str(), row.get(column));
            }
        }

        if !conditions.is_empty() {
            predicates.push(format!("({})", conditions.join(" AND ")));
        }
    }

    if predicates.is_empty() {
        return None;
    }

    Some(Statement {
        sql: format!("DELETE FROM {table_name} WHERE {}", predicates.join(" OR ")),
        params,
    })
}

/// UPDATE of the edited columns of `row`, keyed by its applied key values.
///
/// Without key columns the statement carries no WHERE clause.
pub fn update_statement(table_name: &str, pk_columns: &[String], row: &Row) -> Statement {
    let assignments: Vec<String> = row
        .edits()
        .keys()
        .map(|column| format!("{column} = ?"))
        .collect();
    let mut params: Vec<Value> = row.edits().values().cloned().collect();
    let mut sql = format!("UPDATE {table_name} SET {}", assignments.join(", "));

    if !pk_columns.is_empty() {
        let conditions: Vec<String> = pk_columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect();
        sql.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
        params.extend(
            pk_columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or_default()),
        );
    }

    Statement { sql, params }
}

/// INSERT of exactly the edited columns of `row`.
pub fn insert_statement(table_name: &str, row: &Row) -> Statement {
    if !row.has_edits() {
        return Statement {
            sql: format!("INSERT INTO {table_name} DEFAULT VALUES"),
            params: Vec::new(),
        };
    }

    let columns: Vec<&str> = row.edits().keys().collect();
    let placeholders = vec!["?"; columns.len()];

    Statement {
        sql: format!(
            "INSERT INTO {table_name} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ),
        params: row.edits().values().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{delete_statement, insert_statement, select_statement, update_statement};
    use crate::model::row::Row;
    use crate::model::value::Value;

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string(), "value".to_string()]
    }

    fn row(number: usize, id: Value) -> Row {
        Row::new(
            "t",
            number,
            vec![id, Value::from("Alpha"), Value::from(100)],
            &columns(),
        )
    }

    fn pk() -> Vec<String> {
        vec!["id".to_string()]
    }

    #[test]
    fn select_appends_clauses_in_order() {
        let plain = select_statement("t", None, &[], None);
        assert_eq!(plain.sql, "SELECT * FROM t");
        assert!(plain.params.is_empty());

        let filtered = select_statement(
            "t",
            Some("value > ?"),
            &[Value::from(150)],
            Some("name DESC"),
        );
        assert_eq!(filtered.sql, "SELECT * FROM t WHERE value > ? ORDER BY name DESC");
        assert_eq!(filtered.params, vec![Value::from(150)]);

        let ordered = select_statement("t", None, &[Value::from(1)], Some("id"));
        assert_eq!(ordered.sql, "SELECT * FROM t ORDER BY id");
        assert!(ordered.params.is_empty());
    }

    #[test]
    fn delete_ors_per_row_key_predicates() {
        let rows = vec![row(1, Value::from(1)), row(2, Value::from(2))];
        let statement = delete_statement("t", &pk(), &rows).unwrap();

        assert_eq!(statement.sql, "DELETE FROM t WHERE (id = ?) OR (id = ?)");
        assert_eq!(statement.params, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn delete_matches_null_keys_without_binding() {
        let rows = vec![row(1, Value::Null), row(2, Value::from(2))];
        let statement = delete_statement("t", &pk(), &rows).unwrap();

        assert_eq!(statement.sql, "DELETE FROM t WHERE (id IS NULL) OR (id = ?)");
        assert_eq!(statement.params, vec![Value::from(2)]);
    }

    #[test]
    fn delete_uses_composite_keys_in_key_order() {
        let rows = vec![row(1, Value::from(7))];
        let keys = vec!["name".to_string(), "id".to_string()];
        let statement = delete_statement("t", &keys, &rows).unwrap();

        assert_eq!(statement.sql, "DELETE FROM t WHERE (name = ? AND id = ?)");
        assert_eq!(statement.params, vec![Value::from("Alpha"), Value::from(7)]);
    }

    #[test]
    fn delete_without_keys_matches_all_columns() {
        let rows = vec![row(1, Value::Null)];
        let statement = delete_statement("t", &[], &rows).unwrap();

        assert_eq!(
            statement.sql,
            "DELETE FROM t WHERE (id IS NULL AND name = ? AND value = ?)"
        );
        assert_eq!(statement.params, vec![Value::from("Alpha"), Value::from(100)]);

        let empty = Row::new("t", 1, Vec::new(), &[]);
        assert_eq!(delete_statement("t", &[], &[empty]), None);
    }

    #[test]
    fn delete_without_keys_skips_never_inserted_rows() {
        let mut pending = Row::new("t", 3, Vec::new(), &columns());
        pending.set_new(true);
        assert_eq!(delete_statement("t", &[], &[pending.clone()]), None);

        let rows = vec![pending, row(1, Value::from(1))];
        let statement = delete_statement("t", &[], &rows).unwrap();
        assert_eq!(
            statement.sql,
            "DELETE FROM t WHERE (id = ? AND name = ? AND value = ?)"
        );
        assert_eq!(
            statement.params,
            vec![Value::from(1), Value::from("Alpha"), Value::from(100)]
        );
    }

    #[test]
    fn update_binds_edits_then_applied_keys() {
        let mut target = row(1, Value::from(1));
        target.set("name", "X");
        target.set("id", 99);

        let statement = update_statement("t", &pk(), &target);
        assert_eq!(statement.sql, "UPDATE t SET name = ?, id = ? WHERE id = ?");
        assert_eq!(
            statement.params,
            vec![Value::from("X"), Value::from(99), Value::from(1)]
        );
    }

    #[test]
    fn update_without_keys_has_no_where_clause() {
        let mut target = row(1, Value::from(1));
        target.set("value", 5);

        let statement = update_statement("t", &[], &target);
        assert_eq!(statement.sql, "UPDATE t SET value = ?");
        assert_eq!(statement.params, vec![Value::from(5)]);
    }

    #[test]
    fn insert_lists_only_edited_columns() {
        let mut target = Row::new("t", 3, Vec::new(), &columns());
        target.set("name", "NewUser");
        target.set("value", 500);

        let statement = insert_statement("t", &target);
        assert_eq!(statement.sql, "INSERT INTO t (name, value) VALUES (?, ?)");
        assert_eq!(statement.params, vec![Value::from("NewUser"), Value::from(500)]);
    }

    #[test]
    fn insert_without_edits_uses_defaults() {
        let target = Row::new("t", 3, Vec::new(), &columns());
        let statement = insert_statement("t", &target);

        assert_eq!(statement.sql, "INSERT INTO t DEFAULT VALUES");
        assert!(statement.params.is_empty());
    }
}
