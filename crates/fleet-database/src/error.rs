//! Mapping from sqlx errors to the shared error kinds.

use fleet_core::error::{AppError, ErrorKind};

/// Classify a driver error and prefix it with the failing operation, e.g.
/// `"create invoice: ..."`.
pub(crate) fn storage_error(op: &str, entity: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ErrorKind::Connectivity,
        sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
        _ => ErrorKind::Database,
    };
    let message = format!("{op} {entity}: {err}");
    AppError::with_source(kind, message, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_pool_errors_as_connectivity() {
        let err = storage_error("list", "invoice", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, ErrorKind::Connectivity);
        assert!(err.message.starts_with("list invoice: "));
    }

    #[test]
    fn test_classifies_missing_row_as_not_found() {
        let err = storage_error("get", "driver", sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_errors_are_database_errors() {
        let err = storage_error(
            "update",
            "payment",
            sqlx::Error::Protocol("unexpected message".into()),
        );
        assert_eq!(err.kind, ErrorKind::Database);
    }
}
