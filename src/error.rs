use std::fmt;

use thiserror::Error;

use crate::projection::ProjectionShape;

/// What happened to the open transaction when a statement failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// No transaction was active, so nothing was rolled back.
    NotAttempted,
    /// The transaction was rolled back and the connection is idle again.
    RolledBack,
    /// `ROLLBACK` itself failed; carries the transport's diagnostic.
    Failed(String),
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackOutcome::NotAttempted => Ok(()),
            RollbackOutcome::RolledBack => write!(f, " (transaction rolled back)"),
            RollbackOutcome::Failed(reason) => write!(f, " (rollback failed: {reason})"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PgWrapError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Transaction state error: {0}")]
    TransactionStateError(String),

    #[error("SQL execution error: {message}{rollback}")]
    ExecutionError {
        message: String,
        rollback: RollbackOutcome,
    },

    #[error(
        "Projection error: {shape:?} needs at least {required} column(s), result has {available}"
    )]
    ProjectionError {
        shape: ProjectionShape,
        required: usize,
        available: usize,
    },

    #[error("Argument mismatch: template has {markers} marker(s), {arguments} argument(s) bound")]
    ArgumentMismatch { markers: usize, arguments: usize },

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),
}

impl PgWrapError {
    /// Rollback outcome attached to an execution failure, if any.
    #[must_use]
    pub fn rollback_outcome(&self) -> Option<&RollbackOutcome> {
        match self {
            PgWrapError::ExecutionError { rollback, .. } => Some(rollback),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_transaction_state_error(&self) -> bool {
        matches!(self, PgWrapError::TransactionStateError(_))
    }

    #[must_use]
    pub fn is_argument_mismatch(&self) -> bool {
        matches!(self, PgWrapError::ArgumentMismatch { .. })
    }

    pub(crate) fn execution(message: impl Into<String>, rollback: RollbackOutcome) -> Self {
        PgWrapError::ExecutionError {
            message: message.into(),
            rollback,
        }
    }
}
