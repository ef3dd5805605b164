//! Error handling for heroes-store
//!
//! Wraps heroes-core ExError with store-specific helpers

use heroes_core::errors::{ExError, ExErrorKind, HeroesError};
use rusqlite::ErrorCode;
use std::time::Duration;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Classify a rusqlite error into the error taxonomy
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => ExErrorKind::ConstraintViolation,
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::PermissionDenied
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::SystemIoFailure
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull => ExErrorKind::StorageUnavailable,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => ExErrorKind::Timeout,
            _ => ExErrorKind::Persistence,
        },
        rusqlite::Error::QueryReturnedNoRows => ExErrorKind::NotFound,
        rusqlite::Error::InvalidPath(_) => ExErrorKind::StorageUnavailable,
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Same as `from_rusqlite` but names the operation
pub fn sqlite_op(op: &'static str) -> impl FnOnce(rusqlite::Error) -> ExError {
    move |err| from_rusqlite(err).with_op(op)
}

/// Convert a domain error into the structured error
pub fn domain(err: HeroesError) -> ExError {
    err.into()
}

/// Failure to open or configure the backing database
pub fn storage_unavailable(location: &str, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::StorageUnavailable)
        .with_op("open")
        .with_message(format!("Cannot open database {}: {}", location, err))
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::StorageUnavailable)
        .with_op("ensure_schema")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::StorageUnavailable)
        .with_op("ensure_schema")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Connection acquisition gave up
pub fn acquire_timeout(waited: Duration) -> ExError {
    ExError::new(ExErrorKind::Timeout)
        .with_op("acquire_connection")
        .with_message(format!(
            "Connection not available after {} ms",
            waited.as_millis()
        ))
}

/// A query or filter was built against a table it does not select from
pub fn invalid_query(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("query")
        .with_message(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let ex = from_rusqlite(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(ex.kind(), ExErrorKind::NotFound);
    }

    #[test]
    fn test_constraint_failure_maps_to_constraint_violation() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER NOT NULL)")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t (x) VALUES (NULL)", [])
            .unwrap_err();
        assert_eq!(
            from_rusqlite(err).kind(),
            ExErrorKind::ConstraintViolation
        );
    }

    #[test]
    fn test_sqlite_op_names_operation() {
        let ex = sqlite_op("commit")(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(ex.op(), Some("commit"));
    }
}
