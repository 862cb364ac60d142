//! Error types for temporary table handlers.

use thiserror::Error;
use vesta_common::ErrorCode;

use crate::spec::Representation;

/// Result type for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Errors reported by a [`TableHandler`](crate::TableHandler).
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A row with the same unique key is already stored.
    #[error("duplicate key")]
    DuplicateKey,

    /// The representation cannot accept more rows in its current form.
    #[error("{representation} table is full: {rows} rows, {bytes} bytes")]
    TableFull {
        /// Representation that ran out of room.
        representation: Representation,
        /// Rows stored when the write was refused.
        rows: u64,
        /// Bytes stored when the write was refused.
        bytes: u64,
    },

    /// A single record exceeds what the table accepts.
    #[error("record too large: {size} bytes (max: {max})")]
    RecordTooLarge {
        /// Actual size of the record.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// The hash index was probed before `index_init`.
    #[error("index not initialized")]
    IndexNotInitialized,

    /// The storage could not obtain the resources for a table.
    #[error("out of resources: {0}")]
    OutOfResources(String),

    /// Stored data does not match the expected layout.
    #[error("corrupted table data: {0}")]
    Corrupted(String),

    /// Operation not supported by this handler.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Invalid engine configuration.
    #[error("configuration error: {reason}")]
    ConfigError {
        /// Why the configuration was refused.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// Creates a new corruption error.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a new out-of-resources error.
    pub fn out_of_resources(msg: impl Into<String>) -> Self {
        Self::OutOfResources(msg.into())
    }

    /// Creates a new not-supported error.
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Creates a new configuration error.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateKey => ErrorCode::KeyExists,
            Self::TableFull {
                representation: Representation::OnDisk,
                ..
            } => ErrorCode::DiskFull,
            Self::TableFull { .. } => ErrorCode::TableFull,
            Self::RecordTooLarge { .. } => ErrorCode::RecordTooLarge,
            Self::IndexNotInitialized => ErrorCode::IndexNotInitialized,
            Self::OutOfResources(_) => ErrorCode::OutOfResources,
            Self::Corrupted(_) => ErrorCode::Corruption,
            Self::NotSupported(_) => ErrorCode::NotSupported,
            Self::ConfigError { .. } => ErrorCode::InvalidArgument,
            Self::Io(_) => ErrorCode::Io,
        }
    }
}

/// How a caller must react to a handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Expected outcome that is not a failure (a configured duplicate-key
    /// rejection).
    Ignorable,
    /// The representation is full; promoting the table may help.
    CapacityExceeded,
    /// Anything else. Never retried.
    Other,
}

impl ErrorClass {
    /// Classifies an error given whether duplicate keys are being ignored.
    pub fn of(error: &HandlerError, ignore_dup_key: bool) -> Self {
        match error {
            HandlerError::DuplicateKey if ignore_dup_key => Self::Ignorable,
            HandlerError::TableFull { .. } => Self::CapacityExceeded,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HandlerError::TableFull {
            representation: Representation::InMemory,
            rows: 10,
            bytes: 4096,
        };
        assert_eq!(err.to_string(), "in-memory table is full: 10 rows, 4096 bytes");

        let err = HandlerError::RecordTooLarge { size: 100, max: 50 };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(HandlerError::DuplicateKey.code(), ErrorCode::KeyExists);
        assert_eq!(HandlerError::corrupted("bad").code(), ErrorCode::Corruption);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(HandlerError::from(io).code(), ErrorCode::Io);
    }

    #[test]
    fn test_classification() {
        let dup = HandlerError::DuplicateKey;
        assert_eq!(ErrorClass::of(&dup, true), ErrorClass::Ignorable);
        assert_eq!(ErrorClass::of(&dup, false), ErrorClass::Other);

        let full = HandlerError::TableFull {
            representation: Representation::OnDisk,
            rows: 1,
            bytes: 1,
        };
        assert_eq!(ErrorClass::of(&full, true), ErrorClass::CapacityExceeded);
        assert_eq!(ErrorClass::of(&full, false), ErrorClass::CapacityExceeded);

        let other = HandlerError::IndexNotInitialized;
        assert_eq!(ErrorClass::of(&other, true), ErrorClass::Other);
    }
}
