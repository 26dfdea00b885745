/// Embedded `PostgreSQL` server for live tests
pub mod embedded;

pub use embedded::*;
