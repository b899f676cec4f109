//! PostgreSQL client with primary/replica connection pooling and routing.
//!
//! This module provides the high-level interface for connecting to the
//! primary database and an optional read replica. Every connection
//! acquisition carries an explicit [`ReadIntent`]; read-only work is routed
//! to the replica pool and read-write work to the primary. The module
//! includes error handling, observability through tracing, and
//! production-ready configuration.

pub(crate) mod custom_hooks;
mod pg_client;
mod pg_config;

use deadpool::managed::{Object, Pool};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;

pub use pg_client::{PgClient, PgConn, PgPoolStatus, PoolRole, ReadIntent};
pub use pg_config::PgConfig;

/// Type alias for the connection pools used throughout the application.
pub type ConnectionPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Type alias for a connection object from a pool.
pub type PooledConnection = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;
