//! SQLite connection provider and schema introspection entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections to one database file.
//! - Run parameterized write and read statements on behalf of tables.
//! - Report primary-key metadata for change reconciliation.
//!
//! # Invariants
//! - Every `execute`/`select` call uses its own freshly opened connection.
//! - Engine errors are surfaced unchanged as `DbError::Sqlite`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod manager;
mod open;
pub mod schema;

pub use manager::{DatabaseManager, Executor, ResultSet};
pub use open::{open_db, ConnectionConfig};
pub use schema::{primary_key_columns, table_info, ColumnInfo};

pub type DbResult<T> = Result<T, DbError>;

/// Storage error raised by the backing SQLite engine.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
