// PostgreSQL transport over tokio-postgres
//
// - config: ConnectionParams -> tokio_postgres::Config
// - query: simple-query messages -> ResultSet
// - transport: the blocking PgTransport and its connection registry

pub mod config;
pub mod query;
pub mod transport;

pub use query::build_result_set;
pub use transport::PgTransport;
