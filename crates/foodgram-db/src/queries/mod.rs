//! Repository functions, one module per entity. Every function takes the
//! connection (or transaction) explicitly; `impl Database` blocks in each
//! module wrap them for callers that hold the shared handle.

pub mod catalog;
pub mod follows;
pub mod interactions;
pub mod recipes;
pub mod shopping;
pub mod users;

use rusqlite::types::ToSql;

use crate::Result;

/// `?, ?, ?` for an `IN (...)` list of `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub(crate) fn as_params<T: ToSql>(values: &[T]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v as &dyn ToSql).collect()
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
