//! Materialization errors.

use thiserror::Error;
use vesta_common::ErrorCode;
use vesta_storage::HandlerError;

use crate::encoder::CodecError;

/// Result type for materialization operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors raised by the provisioner and the result sink.
///
/// A rejected duplicate is not an error; see
/// [`InsertOutcome::DuplicateRejected`](super::InsertOutcome::DuplicateRejected).
#[derive(Debug, Error)]
pub enum SinkError {
    /// A value could not be stored in its column. Only the row is lost.
    #[error("cannot store value in column '{column}': {reason}")]
    Projection {
        /// Column name.
        column: String,
        /// Why the value was refused.
        reason: String,
    },

    /// The result table could not be allocated.
    #[error("cannot allocate result table '{table}': {source}")]
    AllocationFailure {
        /// Table alias.
        table: String,
        /// Storage error.
        #[source]
        source: HandlerError,
    },

    /// Unrecoverable storage failure, including a failed promotion.
    #[error("storage failure on result table '{table}': {source}")]
    StorageFatal {
        /// Table alias.
        table: String,
        /// Storage error.
        #[source]
        source: HandlerError,
    },

    /// Operation not valid in the sink's current state.
    #[error("invalid sink state: {0}")]
    InvalidState(String),

    /// A stored record could not be decoded.
    #[error("corrupt result record: {0}")]
    Decode(#[from] CodecError),
}

impl SinkError {
    /// Creates a projection error.
    pub fn projection(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Projection {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Returns true if the error ends the materialization episode.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Projection { .. })
    }

    /// Returns the stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Projection { .. } => ErrorCode::TypeMismatch,
            Self::AllocationFailure { source, .. } | Self::StorageFatal { source, .. } => {
                source.code()
            }
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::Decode(_) => ErrorCode::Corruption,
        }
    }
}
