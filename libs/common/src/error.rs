//! Storage errors shared by both services

use sqlx::{Error as SqlxError, migrate::MigrateError};
use thiserror::Error;

/// Failure while configuring, connecting to or migrating the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Invalid database settings: {0}")]
    Configuration(String),

    #[error("Could not connect to the database: {0}")]
    Connection(#[source] SqlxError),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] MigrateError),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Whether a sqlx error is a unique-constraint violation (duplicate key)
pub fn is_unique_violation(err: &SqlxError) -> bool {
    match err {
        SqlxError::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&SqlxError::RowNotFound));
        assert!(!is_unique_violation(&SqlxError::PoolTimedOut));
    }

    #[test]
    fn test_database_error_display() {
        let err = DatabaseError::Configuration("missing url".to_string());
        assert_eq!(err.to_string(), "Invalid database settings: missing url");
    }
}
