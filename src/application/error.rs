//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add session-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("editor session not initialized")]
    NotInitialized,

    #[error("targeting not enabled: no expression to edit")]
    TargetingNotEnabled,

    #[error("expression is read-only: it does not fit the editable grammar")]
    ReadOnly,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Whether the error stems from malformed persisted data.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(DomainError::MalformedExpression { .. })
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
