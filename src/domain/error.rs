//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::tree::NodeId;

/// Domain errors represent violations of the tree model or the text format.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node {0} does not belong to this tree")]
    NullReference(NodeId),

    #[error("cannot allocate storage for {what}")]
    AllocationFailure { what: String },

    #[error("malformed input at byte {offset}: {message}")]
    MalformedInput { offset: usize, message: String },

    #[error("node {0} is not a leaf")]
    NotALeaf(NodeId),

    #[error("invalid value {value:?}: {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("tree is empty")]
    EmptyTree,

    #[error("invalid path after {taken} step(s): {reason}")]
    InvalidPath { taken: usize, reason: String },
}

impl DomainError {
    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            offset,
            message: message.into(),
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;
