//! Convenient imports for common functionality.

pub use crate::args::{ArgValue, BoundArg, HstoreMap};
pub use crate::config::{ConnectionParams, DriverOptions, Persistence};
pub use crate::database::Database;
pub use crate::error::{PgWrapError, RollbackOutcome};
pub use crate::projection::{Projection, ProjectionShape};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::transaction::{AutoTxPolicy, TxState};
pub use crate::transport::Transport;
pub use crate::types::RowValues;

#[cfg(feature = "postgres")]
pub use crate::database::PgDatabase;
#[cfg(feature = "postgres")]
pub use crate::postgres::PgTransport;
