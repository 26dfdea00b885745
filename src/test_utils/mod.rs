//! Test doubles and fixtures.
//!
//! [`ScriptedTransport`] answers statements from a script instead of a server, so the facade's
//! transaction and projection behavior can be exercised without Postgres. Live-server helpers
//! live in [`postgres`] behind the `test-utils-postgres` feature.

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ConnectionParams;
use crate::error::PgWrapError;
use crate::results::ResultSet;
use crate::template::{LiteralEscaper, escape_string};
use crate::transport::{ExecResult, Transport};
use crate::types::RowValues;

#[cfg(feature = "test-utils-postgres")]
pub mod postgres;

/// How a scripted statement answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return these rows (`TuplesOk`).
    Rows(ResultSet),
    /// Succeed without rows, reporting this many affected rows (`CommandOk`).
    Command(usize),
    /// Fail with this diagnostic.
    Fail(String),
    /// Fail without any diagnostic.
    FailSilently,
}

#[derive(Debug, Default)]
struct LogInner {
    executed: Vec<String>,
    connects: usize,
    closes: usize,
}

/// Shared record of what a [`ScriptedTransport`] was asked to do.
///
/// Cloning shares the record, so a test can keep a handle after moving the transport into a
/// `Database`.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    inner: Arc<Mutex<LogInner>>,
}

impl TransportLog {
    fn with<R>(&self, f: impl FnOnce(&mut LogInner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Every executed statement, in order, trimmed.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.with(|log| log.executed.clone())
    }

    #[must_use]
    pub fn connects(&self) -> usize {
        self.with(|log| log.connects)
    }

    #[must_use]
    pub fn closes(&self) -> usize {
        self.with(|log| log.closes)
    }
}

/// In-memory [`Transport`] driven by substring rules.
///
/// The first rule whose needle occurs in the statement decides the reply; statements matching
/// no rule succeed as commands affecting zero rows.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    rules: Vec<(String, Reply)>,
    refuse_connect: Option<String>,
    backslash_escapes: bool,
    connected: bool,
    last_error: Option<String>,
    log: TransportLog,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `needle` with `reply`.
    #[must_use]
    pub fn reply(mut self, needle: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Make every connection attempt fail with `message`.
    #[must_use]
    pub fn refuse_connections(mut self, message: impl Into<String>) -> Self {
        self.refuse_connect = Some(message.into());
        self
    }

    /// Escape like a server running with `standard_conforming_strings = off`.
    #[must_use]
    pub fn with_backslash_escapes(mut self) -> Self {
        self.backslash_escapes = true;
        self
    }

    #[must_use]
    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.log.executed()
    }

    #[must_use]
    pub fn connects(&self) -> usize {
        self.log.connects()
    }

    fn lookup(&self, sql: &str) -> Reply {
        self.rules
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map_or(Reply::Command(0), |(_, reply)| reply.clone())
    }
}

impl LiteralEscaper for ScriptedTransport {
    fn escape_literal(&self, text: &str) -> Result<String, PgWrapError> {
        escape_string(text, !self.backslash_escapes)
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self, params: &ConnectionParams) -> Result<(), PgWrapError> {
        if let Some(message) = &self.refuse_connect {
            return Err(PgWrapError::ConnectionError(format!(
                "{message} ({})",
                params.session_key()
            )));
        }
        self.connected = true;
        self.log.with(|log| log.connects += 1);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn execute(&mut self, sql: &str) -> ExecResult {
        let sql = sql.trim();
        self.log.with(|log| log.executed.push(sql.to_string()));
        self.last_error = None;
        match self.lookup(sql) {
            Reply::Rows(set) => ExecResult::tuples(set),
            Reply::Command(affected) => ExecResult::command(affected),
            Reply::Fail(message) => {
                self.last_error = Some(message);
                ExecResult::error()
            }
            Reply::FailSilently => ExecResult::error(),
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn close(&mut self) {
        if self.connected {
            self.connected = false;
            self.log.with(|log| log.closes += 1);
        }
    }
}

/// Connection parameters that pass validation; nothing listens on them.
#[must_use]
pub fn dummy_params() -> ConnectionParams {
    ConnectionParams::new("localhost", 5432, "tester", "secret", "testdb")
}

/// Build a result set of text cells; `None` becomes SQL NULL.
#[must_use]
pub fn text_result_set(columns: &[&str], rows: &[&[Option<&str>]]) -> ResultSet {
    ResultSet::from_rows(
        columns.iter().copied(),
        rows.iter().map(|row| {
            row.iter()
                .map(|cell| cell.map_or(RowValues::Null, RowValues::from))
                .collect::<Vec<_>>()
        }),
    )
}
