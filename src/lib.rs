//! Typed SQL templates, an explicit transaction guard and result projections for Postgres.
//!
//! ```rust,no_run
//! use pgwrap::prelude::*;
//! use pgwrap::args;
//!
//! # fn main() -> Result<(), PgWrapError> {
//! let params = ConnectionParams::from_env("TEST")?;
//! let mut db = PgDatabase::connect_postgres(params)?;
//!
//! db.begin()?;
//! db.query("UPDATE users SET name = ?w WHERE id = ?d", &args!["O'Brien", 7])?;
//! db.commit()?;
//!
//! let names = db.select_indexed_column("SELECT id, name FROM users WHERE id IN (?d)", &args![vec![1, 7]])?;
//! # let _ = names;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod config;
pub mod database;
pub mod error;
pub mod prelude;
pub mod projection;
pub mod results;
pub mod template;
pub mod transaction;
pub mod transport;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use args::{ArgValue, BoundArg, HstoreMap};
pub use config::{ConnectionParams, DriverOptions, Persistence};
pub use database::Database;
pub use error::{PgWrapError, RollbackOutcome};
pub use projection::{Projection, ProjectionShape};
pub use results::{CustomDbRow, ResultSet};
pub use template::{LiteralEscaper, MarkerKind, StandardEscaper, render};
pub use transaction::{AutoTxPolicy, TxGuard, TxState};
pub use transport::{ExecResult, ResultStatus, Transport};
pub use types::RowValues;

#[cfg(feature = "postgres")]
pub use database::PgDatabase;
#[cfg(feature = "postgres")]
pub use postgres::PgTransport;
