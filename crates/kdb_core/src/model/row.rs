//! Row model with a pending-edit overlay.
//!
//! # Responsibility
//! - Hold one record's last-known-persisted column values.
//! - Stage caller edits separately until the owning table persists them.
//!
//! # Invariants
//! - `data` keys are lower-cased column names.
//! - `data` changes only by applying `edits` wholesale; applying clears `edits`.
//! - Reads never observe pending edits.

use crate::model::value::Value;
use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::{Display, Formatter};

/// Row number assigned by the owning table.
pub type RowNumber = usize;

/// Insertion-ordered column-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    entries: Vec<(String, Value)>,
}

impl RowData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Inserts or overwrites `key`. Overwrites keep the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RowData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Display for RowData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// One cached table record plus its pending edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    table_name: String,
    row_number: RowNumber,
    data: RowData,
    edits: RowData,
    is_new: bool,
}

impl Row {
    /// Builds a row from positional record values.
    ///
    /// Columns beyond the end of `values` are filled with `Value::Null`;
    /// surplus values are ignored.
    pub fn new(
        table_name: impl Into<String>,
        row_number: RowNumber,
        values: Vec<Value>,
        columns: &[String],
    ) -> Self {
        let mut data = RowData::new();
        let mut values = values.into_iter();
        for column in columns {
            data.insert(column.to_lowercase(), values.next().unwrap_or_default());
        }

        Self {
            table_name: table_name.into(),
            row_number,
            data,
            edits: RowData::new(),
            is_new: false,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn row_number(&self) -> RowNumber {
        self.row_number
    }

    /// Case-insensitive lookup of the applied value for `column_name`.
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.data.get(&column_name.to_lowercase())
    }

    /// Stages `value` for `column_name` without touching applied data.
    ///
    /// The column name is kept exactly as supplied and is not validated.
    pub fn set(&mut self, column_name: &str, value: impl Into<Value>) {
        self.edits.insert(column_name, value.into());
    }

    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Pending edits in the order they were first staged.
    pub fn edits(&self) -> &RowData {
        &self.edits
    }

    /// Whether the row still has to be inserted.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn set_new(&mut self, is_new: bool) {
        self.is_new = is_new;
    }

    /// Applied column values; pending edits are never included.
    pub fn to_representation(&self) -> &RowData {
        &self.data
    }

    /// Merges pending edits into applied data and clears them.
    ///
    /// Reserved for the owning table once the matching write succeeded.
    pub(crate) fn apply_edits(&mut self) {
        debug!(
            "event=row_apply_edits module=row status=start table={} row_number={} before={}",
            self.table_name, self.row_number, self.data
        );

        let edits = std::mem::take(&mut self.edits);
        for (name, value) in edits.entries {
            self.data.insert(name.to_lowercase(), value);
        }

        debug!(
            "event=row_apply_edits module=row status=ok table={} row_number={} after={}",
            self.table_name, self.row_number, self.data
        );
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.table_name, self.data)
    }
}
