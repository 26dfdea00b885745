use crate::args::BoundArg;
use crate::error::PgWrapError;
use crate::transaction::AutoTxPlan;
use crate::transport::Transport;

use super::{ANY_SUCCESS, COMMAND, Database};

impl<T: Transport> Database<T> {
    /// Open an explicit transaction.
    ///
    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if one is already open (nothing is sent to
    /// the server), or `PgWrapError::ExecutionError` if `BEGIN` fails.
    pub fn begin(&mut self) -> Result<(), PgWrapError> {
        self.tx.check_begin()?;
        self.run("BEGIN", ANY_SUCCESS)?;
        self.tx.activate();
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if no transaction is open, or
    /// `PgWrapError::ExecutionError` if `COMMIT` fails (the transaction is then rolled back).
    pub fn commit(&mut self) -> Result<(), PgWrapError> {
        self.tx.check_commit()?;
        self.run("COMMIT", ANY_SUCCESS)?;
        self.tx.reset();
        Ok(())
    }

    /// Roll back the open transaction.
    ///
    /// The guard is `Idle` afterwards even if `ROLLBACK` fails; that failure is returned as is
    /// and no further rollback is attempted.
    ///
    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` if no transaction is open, or
    /// `PgWrapError::ExecutionError` if `ROLLBACK` fails.
    pub fn rollback(&mut self) -> Result<(), PgWrapError> {
        self.tx.check_rollback()?;
        self.tx.reset();
        self.run("ROLLBACK", ANY_SUCCESS).map(|_| ())
    }

    /// Execute a data-changing statement inside the open transaction.
    ///
    /// Returns the number of affected rows. A statement that returns rows is accepted too.
    ///
    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` without a transaction, template errors from
    /// rendering, or `PgWrapError::ExecutionError` (after rolling back) if the statement fails.
    pub fn query(&mut self, template: &str, args: &[BoundArg]) -> Result<usize, PgWrapError> {
        self.tx.check_mutation()?;
        let result = self.render_and_run(template, args, ANY_SUCCESS)?;
        Ok(result.rows_affected)
    }

    /// Like [`Database::query`], but the statement must not return rows.
    ///
    /// # Errors
    /// As [`Database::query`]; a row-returning statement is an execution error.
    pub fn query_affected(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<usize, PgWrapError> {
        self.tx.check_mutation()?;
        let result = self.render_and_run(template, args, COMMAND)?;
        Ok(result.rows_affected)
    }

    /// Execute one data-changing statement in its own transaction.
    ///
    /// Without an open transaction this runs `BEGIN`, the statement and `COMMIT`. With one, the
    /// configured [`AutoTxPolicy`](crate::AutoTxPolicy) decides: `Join` runs the statement in
    /// the open transaction and leaves committing to its owner, `Reject` fails.
    ///
    /// # Errors
    /// Returns `PgWrapError::TransactionStateError` under `Reject` with an open transaction,
    /// and otherwise the errors of [`Database::begin`], [`Database::query`] and
    /// [`Database::commit`].
    pub fn query_auto(&mut self, template: &str, args: &[BoundArg]) -> Result<usize, PgWrapError> {
        match self.tx.plan_auto(self.options.auto_tx)? {
            AutoTxPlan::Join => self.query(template, args),
            AutoTxPlan::Wrap => {
                let sql = self.render(template, args)?;
                self.begin()?;
                let result = self.run(&sql, ANY_SUCCESS)?;
                let last_query = std::mem::take(&mut self.last_query);
                self.commit()?;
                // Observability reflects the statement, not the COMMIT.
                self.last_query = last_query;
                self.rows_quantity = result.len();
                self.affected_rows_quantity = result.rows_affected;
                Ok(result.rows_affected)
            }
        }
    }
}
