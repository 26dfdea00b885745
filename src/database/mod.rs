//! The connection facade: one connection, one transaction guard, typed query helpers.
//!
//! Every call blocks until the transport answers. The connection is opened lazily by the first
//! operation that needs it and closed when the facade is dropped. A `Database` is not meant to
//! be shared between threads without external locking.

mod select;
mod tx;

use crate::args::BoundArg;
use crate::config::{ConnectionParams, DriverOptions};
use crate::error::{PgWrapError, RollbackOutcome};
use crate::results::ResultSet;
use crate::template;
use crate::transaction::{TxGuard, TxState};
use crate::transport::{ResultStatus, Transport};

#[cfg(feature = "postgres")]
use crate::postgres::PgTransport;

pub(crate) const UNDEFINED_ERROR: &str =
    "Undefined error (check if your select query really returns any data).";

const ANY_SUCCESS: &[ResultStatus] = &[ResultStatus::CommandOk, ResultStatus::TuplesOk];
const TUPLES: &[ResultStatus] = &[ResultStatus::TuplesOk];
const COMMAND: &[ResultStatus] = &[ResultStatus::CommandOk];

/// Facade over the production Postgres transport.
#[cfg(feature = "postgres")]
pub type PgDatabase = Database<PgTransport>;

#[derive(Debug)]
pub struct Database<T: Transport> {
    params: ConnectionParams,
    options: DriverOptions,
    transport: T,
    tx: TxGuard,
    last_query: String,
    rows_quantity: usize,
    affected_rows_quantity: usize,
}

#[cfg(feature = "postgres")]
impl Database<PgTransport> {
    /// Facade over a fresh [`PgTransport`] with default options. Does not connect yet.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConfigError` if `params` fail validation.
    pub fn connect_postgres(params: ConnectionParams) -> Result<Self, PgWrapError> {
        Self::new(params, DriverOptions::default(), PgTransport::new())
    }
}

impl<T: Transport> Database<T> {
    /// # Errors
    /// Returns `PgWrapError::ConfigError` if `params` fail validation.
    pub fn new(
        params: ConnectionParams,
        options: DriverOptions,
        transport: T,
    ) -> Result<Self, PgWrapError> {
        params.validate()?;
        Ok(Self {
            params,
            options,
            transport,
            tx: TxGuard::new(),
            last_query: String::new(),
            rows_quantity: 0,
            affected_rows_quantity: 0,
        })
    }

    /// Open the connection unless it is already open.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConnectionError` if the transport cannot connect.
    pub fn connect(&mut self) -> Result<(), PgWrapError> {
        if self.transport.is_connected() {
            return Ok(());
        }
        if self.tx.is_active() {
            tracing::warn!("connection lost with an open transaction; the transaction is gone");
            self.tx.reset();
        }
        self.transport.connect(&self.params)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the connection. Returns `false` if there was nothing to close.
    ///
    /// An open transaction is rolled back first, so a shared persistent session is never handed
    /// on with abandoned work in it.
    pub fn close(&mut self) -> bool {
        if self.tx.is_active() && self.transport.is_connected() {
            tracing::warn!("closing with an open transaction, rolling back");
            let result = self.transport.execute("ROLLBACK");
            if result.status == ResultStatus::Error {
                tracing::warn!(error = %self.failure_message(), "rollback on close failed");
            }
        }
        self.tx.reset();
        if self.transport.is_connected() {
            self.transport.close();
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionParams {
        &self.params
    }

    #[must_use]
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Render a template with this connection's escaping rules.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConnectionError` if the connection cannot be opened, or the
    /// template errors described in [`template::render`].
    pub fn render(&mut self, template: &str, args: &[BoundArg]) -> Result<String, PgWrapError> {
        self.connect()?;
        template::render(template, args, &self.transport, self.options.strict_markers)
    }

    /// Escape `text` for use inside a single-quoted literal.
    ///
    /// # Errors
    /// Returns `PgWrapError::ConnectionError` if the connection cannot be opened, or whatever the
    /// transport's escaper reports.
    pub fn escape(&mut self, text: &str) -> Result<String, PgWrapError> {
        self.connect()?;
        self.transport.escape_literal(text)
    }

    #[must_use]
    pub fn tx_state(&self) -> TxState {
        self.tx.state()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_active()
    }

    /// The most recently executed SQL, trimmed.
    #[must_use]
    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    /// Rows returned by the most recent statement.
    #[must_use]
    pub fn rows_quantity(&self) -> usize {
        self.rows_quantity
    }

    /// Rows affected by the most recent statement.
    #[must_use]
    pub fn affected_rows_quantity(&self) -> usize {
        self.affected_rows_quantity
    }

    fn render_and_run(
        &mut self,
        template: &str,
        args: &[BoundArg],
        accept: &[ResultStatus],
    ) -> Result<ResultSet, PgWrapError> {
        let sql = self.render(template, args)?;
        self.run(&sql, accept)
    }

    /// Execute `sql` and require one of the `accept` statuses.
    ///
    /// Any other outcome is a failure: if a transaction is open it is rolled back before the
    /// error is returned, and the guard goes back to `Idle` either way.
    fn run(&mut self, sql: &str, accept: &[ResultStatus]) -> Result<ResultSet, PgWrapError> {
        self.connect()?;
        self.last_query = sql.trim().to_string();
        tracing::debug!(sql = %self.last_query, "executing");

        let result = self.transport.execute(sql);
        if accept.contains(&result.status) {
            self.rows_quantity = result.result_set.len();
            self.affected_rows_quantity = result.result_set.rows_affected;
            return Ok(result.result_set);
        }

        self.rows_quantity = 0;
        self.affected_rows_quantity = 0;
        let message = self.failure_message();
        let rollback = if self.tx.is_active() {
            self.tx.reset();
            self.auto_rollback(&message)
        } else {
            RollbackOutcome::NotAttempted
        };
        Err(PgWrapError::execution(message, rollback))
    }

    fn auto_rollback(&mut self, cause: &str) -> RollbackOutcome {
        tracing::warn!(error = %cause, "statement failed inside a transaction, rolling back");
        let result = self.transport.execute("ROLLBACK");
        if matches!(result.status, ResultStatus::CommandOk | ResultStatus::TuplesOk) {
            RollbackOutcome::RolledBack
        } else {
            let reason = self.failure_message();
            tracing::warn!(error = %reason, "automatic rollback failed");
            RollbackOutcome::Failed(reason)
        }
    }

    fn failure_message(&self) -> String {
        self.transport
            .last_error()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNDEFINED_ERROR.to_string())
    }
}

impl<T: Transport> Drop for Database<T> {
    fn drop(&mut self) {
        self.close();
    }
}
