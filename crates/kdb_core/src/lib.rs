//! Lightweight change-tracking table cache over a single SQLite file.
//!
//! Load a table with `DatabaseManager::retrieve_table`, stage additions,
//! edits and removals in memory, then persist them with `Table::save`.

pub mod db;
pub mod logging;
pub mod model;
pub mod table;

pub use db::{
    primary_key_columns, table_info, ColumnInfo, ConnectionConfig, DatabaseManager, DbError,
    DbResult, Executor, ResultSet,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::row::{Row, RowData, RowNumber};
pub use model::value::Value;
pub use table::statement::Statement;
pub use table::Table;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
