use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write. Carries the
    /// SQLite message, e.g. `UNIQUE constraint failed: users.email`.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("record not found")]
    NotFound,

    /// CHECK, FOREIGN KEY or NOT NULL violations, plus rules enforced in code
    /// before the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

// SQLITE_CONSTRAINT_PRIMARYKEY and SQLITE_CONSTRAINT_UNIQUE
const CONSTRAINT_PRIMARYKEY: i32 = 1555;
const CONSTRAINT_UNIQUE: i32 = 2067;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg) if e.code == ErrorCode::ConstraintViolation => {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                match e.extended_code {
                    CONSTRAINT_PRIMARYKEY | CONSTRAINT_UNIQUE => DbError::AlreadyExists(detail),
                    _ => DbError::Constraint(detail),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound,
            other => DbError::Sqlite(other),
        }
    }
}

impl DbError {
    /// True when a unique constraint on `table.column` was hit.
    pub fn is_duplicate_of(&self, column: &str) -> bool {
        matches!(self, DbError::AlreadyExists(detail) if detail.contains(column))
    }
}
