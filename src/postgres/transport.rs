use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use crate::config::{ConnectionParams, Persistence};
use crate::error::{PgWrapError, RollbackOutcome};
use crate::template::{LiteralEscaper, escape_string};
use crate::transport::{ExecResult, Transport};

use super::query::build_result_set;

/// Runtime that drives every connection opened by this process.
static RUNTIME: LazyLock<Result<Runtime, String>> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("pgwrap-io")
        .enable_all()
        .build()
        .map_err(|e| e.to_string())
});

/// Shared sessions for `Persistent` / `PersistentForceNew`, keyed by host/port/user/dbname.
static SESSIONS: LazyLock<Mutex<HashMap<String, Arc<Session>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn runtime() -> Result<&'static Runtime, PgWrapError> {
    if Handle::try_current().is_ok() {
        return Err(PgWrapError::ConnectionError(
            "blocking database call made from inside an async runtime; \
             move it to tokio::task::spawn_blocking"
                .to_string(),
        ));
    }
    RUNTIME
        .as_ref()
        .map_err(|e| PgWrapError::ConnectionError(format!("cannot start I/O runtime: {e}")))
}

#[derive(Debug)]
struct Session {
    client: Client,
    standard_conforming_strings: bool,
}

impl Session {
    fn is_alive(&self) -> bool {
        !self.client.is_closed()
    }
}

/// Blocking transport over `tokio-postgres`.
///
/// Statements go through the simple-query protocol, so a template may hold several
/// statements and every value comes back as text.
#[derive(Debug, Default)]
pub struct PgTransport {
    session: Option<Arc<Session>>,
    shared: bool,
    last_error: Option<String>,
}

impl PgTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn open(params: &ConnectionParams) -> Result<Arc<Session>, PgWrapError> {
        let config = params.to_tokio_config();
        runtime()?.block_on(async {
            let (client, connection) = config.connect(NoTls).await.map_err(|e| {
                PgWrapError::ConnectionError(format!(
                    "Failed to connect to {}:{}/{}: {e}",
                    params.host, params.port, params.dbname
                ))
            })?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(error = %e, "postgres connection terminated");
                }
            });

            let messages = client
                .simple_query("SHOW standard_conforming_strings")
                .await
                .map_err(|e| {
                    PgWrapError::ConnectionError(format!(
                        "Failed to read standard_conforming_strings: {e}"
                    ))
                })?;
            let standard_conforming_strings = messages
                .iter()
                .find_map(|m| match m {
                    SimpleQueryMessage::Row(row) => row.get(0).map(|v| v != "off"),
                    _ => None,
                })
                .unwrap_or(true);

            Ok(Arc::new(Session {
                client,
                standard_conforming_strings,
            }))
        })
    }

    fn shared_session(
        params: &ConnectionParams,
        force_new: bool,
    ) -> Result<Arc<Session>, PgWrapError> {
        let mut sessions = SESSIONS.lock().unwrap_or_else(PoisonError::into_inner);
        let key = params.session_key();
        if !force_new {
            if let Some(session) = sessions.get(&key).filter(|s| s.is_alive()) {
                tracing::debug!(%key, "reusing persistent connection");
                return Ok(Arc::clone(session));
            }
        }
        let session = Self::open(params)?;
        sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }
}

impl LiteralEscaper for PgTransport {
    fn escape_literal(&self, text: &str) -> Result<String, PgWrapError> {
        let standard = self
            .session
            .as_ref()
            .is_none_or(|s| s.standard_conforming_strings);
        escape_string(text, standard)
    }
}

impl Transport for PgTransport {
    fn connect(&mut self, params: &ConnectionParams) -> Result<(), PgWrapError> {
        if self.is_connected() {
            return Ok(());
        }
        let (session, shared) = match params.persistence {
            Persistence::Plain => (Self::open(params)?, false),
            Persistence::Persistent => (Self::shared_session(params, false)?, true),
            Persistence::PersistentForceNew => (Self::shared_session(params, true)?, true),
        };
        tracing::info!(
            host = %params.host,
            port = params.port,
            dbname = %params.dbname,
            persistence = %params.persistence,
            "connected"
        );
        self.session = Some(session);
        self.shared = shared;
        self.last_error = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_alive())
    }

    fn execute(&mut self, sql: &str) -> ExecResult {
        self.last_error = None;
        let Some(session) = self.session.as_ref() else {
            self.last_error = Some("connection is not open".to_string());
            return ExecResult::error();
        };
        let outcome = runtime().and_then(|rt| {
            rt.block_on(session.client.simple_query(sql))
                .map_err(|e| {
                    let message = e.as_db_error().map_or_else(
                        || e.to_string(),
                        |db| format!("{}:  {}", db.severity(), db.message()),
                    );
                    PgWrapError::execution(message, RollbackOutcome::NotAttempted)
                })
                .and_then(build_result_set)
        });
        match outcome {
            Ok(result) => result,
            Err(PgWrapError::ExecutionError { message, .. }) => {
                self.last_error = Some(message);
                ExecResult::error()
            }
            Err(other) => {
                self.last_error = Some(other.to_string());
                ExecResult::error()
            }
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::info!(shared = self.shared, "connection closed");
        }
        self.shared = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconnected_transport_reports_errors() {
        let mut transport = PgTransport::new();
        assert!(!transport.is_connected());
        let result = transport.execute("SELECT 1");
        assert_eq!(result.status, crate::transport::ResultStatus::Error);
        assert_eq!(
            transport.last_error().as_deref(),
            Some("connection is not open")
        );
        transport.close();
        transport.close();
    }

    #[test]
    fn escapes_without_a_session_as_standard_conforming() {
        let transport = PgTransport::new();
        assert_eq!(transport.escape_literal(r"it's \n").unwrap(), r"it''s \n");
    }

    #[tokio::test]
    async fn refuses_to_block_inside_a_runtime() {
        let err = runtime().unwrap_err();
        assert!(matches!(err, PgWrapError::ConnectionError(_)));
    }
}
