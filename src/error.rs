use crate::isolation::IsolationLevel;

/// Error types for unit-of-work operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The value does not name a known isolation level
    #[error("Unknown transaction isolation level: {0}")]
    InvalidIsolationLevel(String),

    /// The store could not open a transaction
    #[error("Failed to begin transaction: {0}")]
    BeginFailed(#[source] sqlx::Error),

    /// The transaction was opened but the store rejected the isolation directive
    #[error("Failed to set transaction isolation level {level}: {source}")]
    IsolationSetFailed {
        level: IsolationLevel,
        #[source]
        source: sqlx::Error,
    },

    /// The store rejected the commit
    #[error("Failed to commit transaction: {0}")]
    CommitFailed(#[source] sqlx::Error),

    /// The store rejected the rollback
    #[error("Failed to roll back transaction: {0}")]
    RollbackFailed(#[source] sqlx::Error),

    /// Database error from a statement issued through a handle
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transaction has already been consumed (committed or rolled back)
    #[error("Transaction has already been consumed")]
    AlreadyConsumed,

    /// A unit of work failed and the rollback issued afterwards failed too
    #[error("{error}; additionally the rollback failed: {rollback}")]
    RollbackAfterFailure {
        #[source]
        error: Box<Error>,
        rollback: Box<Error>,
    },
}

/// Fieldless classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidIsolationLevel,
    BeginFailed,
    IsolationSetFailed,
    CommitFailed,
    RollbackFailed,
    Database,
    AlreadyConsumed,
    RollbackAfterFailure,
}

impl Error {
    /// Returns the kind of failure, for callers deciding whether to retry
    /// the whole unit of work with a new transaction.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidIsolationLevel(_) => ErrorKind::InvalidIsolationLevel,
            Error::BeginFailed(_) => ErrorKind::BeginFailed,
            Error::IsolationSetFailed { .. } => ErrorKind::IsolationSetFailed,
            Error::CommitFailed(_) => ErrorKind::CommitFailed,
            Error::RollbackFailed(_) => ErrorKind::RollbackFailed,
            Error::Database(_) => ErrorKind::Database,
            Error::AlreadyConsumed => ErrorKind::AlreadyConsumed,
            Error::RollbackAfterFailure { .. } => ErrorKind::RollbackAfterFailure,
        }
    }

    /// Returns the underlying store error, if this failure came from the store.
    ///
    /// For [`Error::RollbackAfterFailure`] this is the cause of the original failure.
    pub fn store_error(&self) -> Option<&sqlx::Error> {
        match self {
            Error::BeginFailed(e)
            | Error::CommitFailed(e)
            | Error::RollbackFailed(e)
            | Error::Database(e) => Some(e),
            Error::IsolationSetFailed { source, .. } => Some(source),
            Error::RollbackAfterFailure { error, .. } => error.store_error(),
            Error::InvalidIsolationLevel(_) | Error::AlreadyConsumed => None,
        }
    }
}

/// Result type alias for unit-of-work operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn commit_failure_keeps_cause() {
        let err = Error::CommitFailed(sqlx::Error::Protocol("serialization failure".into()));
        assert_eq!(err.kind(), ErrorKind::CommitFailed);
        assert!(matches!(
            err.store_error(),
            Some(sqlx::Error::Protocol(m)) if m == "serialization failure"
        ));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("serialization failure"));
    }

    #[test]
    fn isolation_set_failure_names_level() {
        let err = Error::IsolationSetFailed {
            level: IsolationLevel::Serializable,
            source: sqlx::Error::Protocol("not permitted".into()),
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to set transaction isolation level SERIALIZABLE: "));
        assert!(message.ends_with("not permitted"));
    }

    #[test]
    fn rollback_after_failure_reports_original_cause() {
        let err = Error::RollbackAfterFailure {
            error: Box::new(Error::Database(sqlx::Error::RowNotFound)),
            rollback: Box::new(Error::RollbackFailed(sqlx::Error::PoolClosed)),
        };
        assert_eq!(err.kind(), ErrorKind::RollbackAfterFailure);
        assert!(matches!(err.store_error(), Some(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn local_errors_have_no_store_cause() {
        assert!(Error::AlreadyConsumed.store_error().is_none());
        assert!(Error::InvalidIsolationLevel("99".into()).store_error().is_none());
    }
}
