use crate::config::ConnectionParams;
use crate::error::PgWrapError;
use crate::results::ResultSet;
use crate::template::LiteralEscaper;

/// Outcome class of one executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// Statement completed without returning rows.
    CommandOk,
    /// Statement returned a row set (possibly empty).
    TuplesOk,
    /// Statement failed; see [`Transport::last_error`].
    Error,
}

/// Result of [`Transport::execute`].
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub status: ResultStatus,
    pub result_set: ResultSet,
}

impl ExecResult {
    #[must_use]
    pub fn command(rows_affected: usize) -> Self {
        Self {
            status: ResultStatus::CommandOk,
            result_set: ResultSet::command(rows_affected),
        }
    }

    #[must_use]
    pub fn tuples(result_set: ResultSet) -> Self {
        Self {
            status: ResultStatus::TuplesOk,
            result_set,
        }
    }

    #[must_use]
    pub fn error() -> Self {
        Self {
            status: ResultStatus::Error,
            result_set: ResultSet::default(),
        }
    }
}

/// The blocking connection a [`Database`](crate::Database) drives.
///
/// Implementations own at most one physical connection. `execute` never returns a Rust error
/// for a failed statement: it reports [`ResultStatus::Error`] and keeps the diagnostic for
/// [`Transport::last_error`], which is what the facade needs to decide about rolling back.
pub trait Transport: LiteralEscaper {
    /// Open the connection.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConnectionError` if the server cannot be reached or refuses the
    /// credentials.
    fn connect(&mut self, params: &ConnectionParams) -> Result<(), PgWrapError>;

    fn is_connected(&self) -> bool;

    /// Run `sql` and materialize its result.
    fn execute(&mut self, sql: &str) -> ExecResult;

    /// Diagnostic of the most recent failure on this connection.
    fn last_error(&self) -> Option<String>;

    /// Close the connection. Calling this on a closed connection does nothing.
    fn close(&mut self);
}
