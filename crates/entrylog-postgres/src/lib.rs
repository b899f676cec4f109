#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging.

/// Tracing target for database connection operations.
///
/// Use this target for logging connection establishment, pool management,
/// routing decisions and connection errors.
pub const TRACING_TARGET_CONNECTION: &str = "entrylog_postgres::connection";

/// Tracing target for database query operations.
///
/// Use this target for logging query execution, pagination and query-related errors.
pub const TRACING_TARGET_QUERY: &str = "entrylog_postgres::query";

mod client;
mod error;
pub mod model;
pub mod prelude;
pub mod query;
mod schema;
pub mod types;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, PgClient, PgConfig, PgConn, PgPoolStatus, PoolRole, PooledConnection,
    ReadIntent,
};
pub use crate::error::{BoxError, ErrorHint, PgError, PgResult};
