use std::sync::Arc;

use tokio_postgres::SimpleQueryMessage;

use crate::error::{PgWrapError, RollbackOutcome};
use crate::results::ResultSet;
use crate::transport::ExecResult;
use crate::types::RowValues;

/// Build the result of a simple-query round trip.
///
/// A query string may hold several statements; the last one decides the status and supplies the
/// rows and the affected-row count. Values arrive in text format and are kept as
/// `RowValues::Text`, with SQL NULL as `RowValues::Null`.
///
/// # Errors
/// Returns `PgWrapError::ExecutionError` if a row cannot be decoded.
pub fn build_result_set(messages: Vec<SimpleQueryMessage>) -> Result<ExecResult, PgWrapError> {
    let mut last = ExecResult::command(0);
    let mut current: Option<ResultSet> = None;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                let mut set = ResultSet::default();
                set.set_column_names(Arc::new(
                    columns.iter().map(|c| c.name().to_string()).collect(),
                ));
                current = Some(set);
            }
            SimpleQueryMessage::Row(row) => {
                let set = current.get_or_insert_with(|| {
                    let mut set = ResultSet::default();
                    set.set_column_names(Arc::new(
                        row.columns().iter().map(|c| c.name().to_string()).collect(),
                    ));
                    set
                });
                let values = (0..row.len())
                    .map(|idx| {
                        row.try_get(idx)
                            .map(|value| value.map_or(RowValues::Null, RowValues::from))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        PgWrapError::execution(
                            format!("cannot decode row: {e}"),
                            RollbackOutcome::NotAttempted,
                        )
                    })?;
                set.add_row_values(values);
            }
            SimpleQueryMessage::CommandComplete(count) => {
                let rows_affected = usize::try_from(count).unwrap_or(usize::MAX);
                last = match current.take() {
                    Some(mut set) => {
                        set.rows_affected = rows_affected;
                        ExecResult::tuples(set)
                    }
                    None => ExecResult::command(rows_affected),
                };
            }
            _ => {}
        }
    }

    if let Some(set) = current {
        last = ExecResult::tuples(set);
    }
    Ok(last)
}
