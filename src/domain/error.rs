//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Domain errors represent expression grammar and tree structure violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Persisted expression has an unrecognized or self-contradictory shape.
    #[error("malformed expression at {path}: {reason}")]
    MalformedExpression { path: String, reason: String },

    #[error("invalid node kind for {operation}: expected {expected}, found {found}")]
    InvalidNodeKind {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("node already attached to a tree: {0:?}")]
    NodeAlreadyAttached(NodeId),

    #[error("appending {0:?} would create a cycle")]
    WouldCreateCycle(NodeId),

    #[error("{group} group limit reached: at most {limit}")]
    GroupLimitReached { group: &'static str, limit: usize },
}

impl DomainError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        let path = if path.is_empty() { "/" } else { path };
        Self::MalformedExpression {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
