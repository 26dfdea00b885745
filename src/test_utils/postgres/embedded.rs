use std::sync::LazyLock;

use postgresql_embedded::PostgreSQL;
use tokio::runtime::Runtime;

use crate::config::ConnectionParams;

/// Runtime that drives the embedded server's setup and shutdown.
static SHARED_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("Failed to create tokio runtime for test utilities"));

/// A running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    /// Parameters that reach the test database as the embedded superuser.
    pub params: ConnectionParams,
}

/// Install (if needed), start and provision an embedded server with database `dbname`.
///
/// Must be called from a thread that is not running a tokio runtime.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, or the database cannot be
/// created.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(dbname).await?;

        let settings = postgresql.settings();
        let params = ConnectionParams::new(
            settings.host.clone(),
            settings.port,
            settings.username.clone(),
            settings.password.clone(),
            dbname,
        );
        tracing::info!(port = params.port, %dbname, "embedded postgres started");

        Ok(EmbeddedPostgres { postgresql, params })
    })
}

/// Stop a previously started embedded server.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
