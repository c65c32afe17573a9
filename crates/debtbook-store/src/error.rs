use std::time::Duration;

use debtbook_types::{DebtorId, TypeError};

use crate::view::Phase;

/// Errors from the storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The collaborator could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered but refused the operation.
    #[error("collaborator rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The collaborator returned data that does not fit the ledger schema.
    #[error("malformed {collection} data: {reason}")]
    Malformed {
        collection: &'static str,
        reason: String,
    },

    /// The collaborator did not answer within the configured timeout.
    #[error("collaborator call timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error from a local storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn malformed(collection: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            collection,
            reason: reason.to_string(),
        }
    }
}

/// Result alias for collaborator operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Coarse classification of a [`LedgerError`], for presentation layers that
/// only need to pick a message style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input violated a precondition. Never changes the view.
    Validation,
    /// A create referenced a debtor that is not in the current view.
    NotFound,
    /// The collaborator failed. Retryable.
    Storage,
}

/// Errors from ledger store operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    Invalid(TypeError),

    #[error("ledger is not ready (currently {0})")]
    NotReady(Phase),

    #[error("debtor not found: {0}")]
    DebtorNotFound(DebtorId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) | Self::NotReady(_) => ErrorKind::Validation,
            Self::DebtorNotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

/// Result alias for ledger store operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert!(LedgerError::Invalid(TypeError::EmptyName).is_validation());
        assert!(LedgerError::NotReady(Phase::Loading).is_validation());
        assert!(LedgerError::DebtorNotFound(DebtorId::new("x")).is_not_found());
        assert!(LedgerError::from(StorageError::Timeout(Duration::from_secs(1))).is_storage());
    }

    #[test]
    fn storage_message_is_not_wrapped_twice() {
        let err = LedgerError::from(StorageError::Unavailable("connection refused".into()));
        assert_eq!(err.to_string(), "collaborator unavailable: connection refused");
    }
}
