//! Storage error types with duplicate-key translation.

use mongodb::error::{ErrorKind as MongoErrorKind, InsertManyError, WriteFailure};
use thiserror::Error;

/// Server error codes reported for unique-index conflicts.
const DUPLICATE_KEY_CODES: [i32; 3] = [11000, 11001, 12582];

/// Server error code for "namespace not found".
pub(crate) const NAMESPACE_NOT_FOUND: i32 = 26;

/// Errors returned by models and the storage accessor.
#[derive(Error, Debug)]
pub enum StoreError {
    // Identifier errors
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // Connection errors
    #[error("MongoDB connection error: {0}")]
    Connection(#[source] mongodb::error::Error),

    // Encoding errors
    #[error("Failed to encode document: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Failed to decode document: {0}")]
    Deserialization(#[from] bson::de::Error),

    // Write errors
    #[error("Duplicate key: {message}")]
    DuplicateKey { message: String },

    #[error("MongoDB error: {0}")]
    Store(#[source] mongodb::error::Error),

    // Execution context errors
    #[error("Operation canceled")]
    ContextCanceled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

/// Stable category of a [`StoreError`], for callers that branch on the
/// kind of failure rather than its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    InvalidIdentifier,
    Connection,
    Serialization,
    DuplicateKey,
    Store,
    ContextCanceled,
}

impl StoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::InvalidIdentifier(_) => StoreErrorKind::InvalidIdentifier,
            StoreError::Connection(_) => StoreErrorKind::Connection,
            StoreError::Serialization(_) | StoreError::Deserialization(_) => {
                StoreErrorKind::Serialization
            }
            StoreError::DuplicateKey { .. } => StoreErrorKind::DuplicateKey,
            StoreError::Store(_) => StoreErrorKind::Store,
            StoreError::ContextCanceled | StoreError::DeadlineExceeded => {
                StoreErrorKind::ContextCanceled
            }
        }
    }

    /// Translates a driver error raised by a write.
    ///
    /// Unique-index conflicts become [`StoreError::DuplicateKey`]; anything
    /// else is wrapped as [`StoreError::Store`].
    pub fn from_write(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            tracing::warn!(error = %err, "Duplicate key on insert");
            StoreError::DuplicateKey {
                message: err.to_string(),
            }
        } else {
            StoreError::Store(err)
        }
    }
}

/// Returns true when the driver error reports a unique-index conflict.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        MongoErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            is_duplicate_code(write_error.code)
        }
        MongoErrorKind::InsertMany(InsertManyError {
            write_errors: Some(write_errors),
            ..
        }) => write_errors.iter().any(|e| is_duplicate_code(e.code)),
        MongoErrorKind::Command(command_error) => is_duplicate_code(command_error.code),
        _ => false,
    }
}

/// Returns the server error code of a command error, if any.
pub(crate) fn command_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        MongoErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

fn is_duplicate_code(code: i32) -> bool {
    DUPLICATE_KEY_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::options::ClientOptions;

    async fn invalid_argument_error() -> mongodb::error::Error {
        ClientOptions::parse("not-a-mongodb-uri")
            .await
            .expect_err("uri without scheme must be rejected")
    }

    #[test]
    fn test_duplicate_codes() {
        assert!(is_duplicate_code(11000));
        assert!(is_duplicate_code(11001));
        assert!(is_duplicate_code(12582));
        assert!(!is_duplicate_code(26));
        assert!(!is_duplicate_code(0));
    }

    #[tokio::test]
    async fn test_non_write_error_is_not_duplicate() {
        let err = invalid_argument_error().await;
        assert!(!is_duplicate_key(&err));
        assert_eq!(command_code(&err), None);
    }

    #[tokio::test]
    async fn test_from_write_wraps_other_errors() {
        let err = StoreError::from_write(invalid_argument_error().await);
        assert!(matches!(err, StoreError::Store(_)));
        assert_eq!(err.kind(), StoreErrorKind::Store);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            StoreError::InvalidIdentifier("x".into()).kind(),
            StoreErrorKind::InvalidIdentifier
        );
        assert_eq!(
            StoreError::DuplicateKey {
                message: "E11000".into()
            }
            .kind(),
            StoreErrorKind::DuplicateKey
        );
        let decode_err = bson::from_document::<i64>(bson::doc! { "a": 1 }).unwrap_err();
        assert_eq!(
            StoreError::from(decode_err).kind(),
            StoreErrorKind::Serialization
        );
        assert_eq!(
            StoreError::ContextCanceled.kind(),
            StoreErrorKind::ContextCanceled
        );
        assert_eq!(
            StoreError::DeadlineExceeded.kind(),
            StoreErrorKind::ContextCanceled
        );
    }
}
