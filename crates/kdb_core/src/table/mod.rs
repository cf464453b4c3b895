//! Change-tracking table cache with deferred writes.
//!
//! # Responsibility
//! - Load all rows of one named table, optionally filtered and sorted.
//! - Stage row additions, edits and removals in memory.
//! - Reconcile staged changes with the database on `save`.
//!
//! # Invariants
//! - Row numbers are unique per retrieval generation and restart at 1 on
//!   every `retrieve`.
//! - `save` runs the delete, update and insert passes in that order.
//! - Staged state is cleared only after the matching statement succeeded.
//! - Lookups by unknown row number or column never fail.

use crate::db::{primary_key_columns, DatabaseManager, DbResult, Executor};
use crate::model::row::{Row, RowNumber};
use crate::model::value::Value;
use log::debug;

pub mod statement;

use statement::{delete_statement, insert_statement, select_statement, update_statement};

/// In-memory cache of one table's rows plus staged changes.
///
/// `where`/`order by` fragments are raw SQL supplied by the caller; only
/// their bind values are parameterized.
pub struct Table<'db, E: Executor + ?Sized = DatabaseManager> {
    db: &'db E,
    table_name: String,
    row_counter: RowNumber,
    where_clause: Option<String>,
    where_params: Vec<Value>,
    order_by_clause: Option<String>,
    rows: Vec<Row>,
    deleted_rows: Vec<Row>,
    columns: Vec<String>,
}

impl<'db, E: Executor + ?Sized> Table<'db, E> {
    /// Creates an empty table handle; nothing is read until `retrieve`.
    pub fn new(db: &'db E, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
            row_counter: 0,
            where_clause: None,
            where_params: Vec::new(),
            order_by_clause: None,
            rows: Vec::new(),
            deleted_rows: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.table_name
    }

    /// Sets the WHERE fragment and its positional parameters.
    ///
    /// The filter stays in effect for every later `retrieve` until replaced.
    pub fn filter<I, V>(&mut self, clause: impl Into<String>, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_clause = Some(clause.into());
        self.where_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the ORDER BY fragment used by later `retrieve` calls.
    pub fn order_by(&mut self, clause: impl Into<String>) -> &mut Self {
        self.order_by_clause = Some(clause.into());
        self
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn where_params(&self) -> &[Value] {
        &self.where_params
    }

    pub fn order_by_clause(&self) -> Option<&str> {
        self.order_by_clause.as_deref()
    }

    /// Replaces the row cache with the current database contents.
    ///
    /// # Side effects
    /// - Drops cached rows and staged removals.
    /// - Refreshes `columns` from the result metadata.
    /// - Restarts row numbering at 1.
    pub fn retrieve(&mut self) -> DbResult<&mut Self> {
        let statement = select_statement(
            &self.table_name,
            self.where_clause.as_deref(),
            &self.where_params,
            self.order_by_clause.as_deref(),
        );
        let result = self.db.select(&statement.sql, &statement.params)?;

        self.columns = result
            .columns()
            .iter()
            .map(|column| column.to_lowercase())
            .collect();
        self.rows.clear();
        self.deleted_rows.clear();
        self.row_counter = 0;

        for record in result {
            self.row_counter += 1;
            self.rows.push(Row::new(
                self.table_name.as_str(),
                self.row_counter,
                record,
                &self.columns,
            ));
        }

        debug!(
            "event=table_retrieve module=table status=ok table={} columns={:?} record_count={}",
            self.table_name, self.columns, self.row_counter
        );

        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cached rows in retrieval/addition order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows staged for deletion on the next `save`.
    pub fn deleted_rows(&self) -> &[Row] {
        &self.deleted_rows
    }

    /// Lower-cased column names from the last `retrieve`.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn row(&self, row_number: RowNumber) -> Option<&Row> {
        self.rows.iter().find(|row| row.row_number() == row_number)
    }

    pub fn row_mut(&mut self, row_number: RowNumber) -> Option<&mut Row> {
        self.rows
            .iter_mut()
            .find(|row| row.row_number() == row_number)
    }

    /// Appends an empty new row shaped like the retrieved columns.
    ///
    /// Returns the assigned row number. Nothing is written until `save`.
    pub fn add_row(&mut self) -> RowNumber {
        self.row_counter += 1;
        let mut row = Row::new(
            self.table_name.as_str(),
            self.row_counter,
            Vec::new(),
            &self.columns,
        );
        row.set_new(true);
        self.rows.push(row);

        debug!(
            "event=row_added module=table table={} row_number={}",
            self.table_name, self.row_counter
        );

        self.row_counter
    }

    /// Adds a new row and stages one edit per column/value pair.
    pub fn add<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let row_number = self.add_row();
        for (column_name, value) in values {
            self.set(row_number, column_name.as_ref(), value);
        }
        self
    }

    /// Applied value of `column_name` in row `row_number`, if both exist.
    pub fn get(&self, row_number: RowNumber, column_name: &str) -> Option<&Value> {
        self.row(row_number).and_then(|row| row.get(column_name))
    }

    /// Stages an edit on row `row_number`; unknown row numbers are ignored.
    pub fn set(&mut self, row_number: RowNumber, column_name: &str, value: impl Into<Value>) {
        if let Some(row) = self.row_mut(row_number) {
            row.set(column_name, value);
        }
    }

    /// Value lookup on row number 1, not on the first cached row.
    pub fn get_first(&self, column_name: &str) -> Option<&Value> {
        self.get(1, column_name)
    }

    /// Edit on row number 1, not on the first cached row.
    pub fn set_first(&mut self, column_name: &str, value: impl Into<Value>) {
        self.set(1, column_name, value);
    }

    /// Stages row `row_number` for deletion.
    pub fn remove(&mut self, row_number: RowNumber) -> &mut Self {
        self.remove_where(|row| row.row_number() == row_number);
        self
    }

    /// Stages every cached row for deletion.
    pub fn remove_all(&mut self) -> &mut Self {
        self.remove_where(|_| true);
        self
    }

    /// Persists staged deletions, edits and insertions.
    ///
    /// Each pass commits on its own; a failure leaves earlier passes
    /// persisted and the failing row's staged state untouched.
    pub fn save(&mut self) -> DbResult<()> {
        debug!(
            "event=table_save module=table status=start table={} deleted={} rows={}",
            self.table_name,
            self.deleted_rows.len(),
            self.rows.len()
        );

        let mut pk_columns = None;
        self.delete_rows(&mut pk_columns)?;
        self.update_rows(&mut pk_columns)?;
        self.insert_rows()?;

        debug!(
            "event=table_save module=table status=ok table={}",
            self.table_name
        );
        Ok(())
    }

    fn delete_rows(&mut self, pk_cache: &mut Option<Vec<String>>) -> DbResult<()> {
        if self.deleted_rows.is_empty() {
            return Ok(());
        }

        let pk_columns = cached_primary_keys(self.db, &self.table_name, pk_cache)?;
        let statement = delete_statement(&self.table_name, pk_columns, &self.deleted_rows);
        if let Some(statement) = statement {
            self.db.execute(&statement.sql, &statement.params)?;
        }

        self.deleted_rows.clear();
        Ok(())
    }

    fn update_rows(&mut self, pk_cache: &mut Option<Vec<String>>) -> DbResult<()> {
        if !self.rows.iter().any(needs_update) {
            return Ok(());
        }

        let pk_columns = cached_primary_keys(self.db, &self.table_name, pk_cache)?;
        for row in self.rows.iter_mut().filter(|row| needs_update(row)) {
            let statement = update_statement(&self.table_name, pk_columns, row);
            self.db.execute(&statement.sql, &statement.params)?;
            row.apply_edits();
        }

        Ok(())
    }

    fn insert_rows(&mut self) -> DbResult<()> {
        for row in self.rows.iter_mut().filter(|row| row.is_new()) {
            let statement = insert_statement(&self.table_name, row);
            self.db.execute(&statement.sql, &statement.params)?;
            row.apply_edits();
            row.set_new(false);
        }

        Ok(())
    }

    fn remove_where(&mut self, mut condition: impl FnMut(&Row) -> bool) {
        let mut index = 0;
        while index < self.rows.len() {
            if condition(&self.rows[index]) {
                let row = self.rows.remove(index);
                debug!(
                    "event=row_removed module=table table={} row_number={}",
                    self.table_name,
                    row.row_number()
                );
                self.deleted_rows.push(row);
            } else {
                index += 1;
            }
        }
    }
}

impl<'a, 'db, E: Executor + ?Sized> IntoIterator for &'a Table<'db, E> {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn needs_update(row: &Row) -> bool {
    !row.is_new() && row.has_edits()
}

/// Loads primary-key columns once per save cycle.
fn cached_primary_keys<'c, E: Executor + ?Sized>(
    db: &E,
    table_name: &str,
    cache: &'c mut Option<Vec<String>>,
) -> DbResult<&'c [String]> {
    if cache.is_none() {
        *cache = Some(primary_key_columns(db, table_name)?);
    }
    Ok(cache.as_deref().unwrap_or_default())
}
