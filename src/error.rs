//! Error types for call history operations
//!
//! Tombstoned records and rejected status transitions are deliberately not
//! represented here: both are logged no-ops that return `Ok`.

use crate::model::{CallStatus, CallType};

pub type Result<T, E = CallRecordError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum CallRecordError {
    /// Failure reported by the storage engine.
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An identifier could not be resolved to a local conversation.
    #[error("missing conversation: {0}")]
    MissingConversation(String),

    /// A collaborator-owned row this operation relies on is absent.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// A persisted column held a value that maps to no known variant.
    #[error("cannot decode {column} from {value}")]
    Decode { column: &'static str, value: String },

    #[error("ringer identity can only be set on ringing calls, status is {status:?}")]
    RingerNotAllowed { status: CallStatus },

    #[error("status {status:?} does not belong to call type {call_type:?}")]
    MismatchedStatus {
        call_type: CallType,
        status: CallStatus,
    },
}

impl CallRecordError {
    pub(crate) fn decode(column: &'static str, value: impl ToString) -> Self {
        Self::Decode {
            column,
            value: value.to_string(),
        }
    }
}
