//! Prelude module for entrylog-postgres.
//!
//! This module re-exports the most commonly used types and traits from
//! entrylog-postgres, making it easy to import everything you need with a
//! single `use` statement.
//!
//! # Example
//!
//! ```rust,no_run
//! use entrylog_postgres::prelude::*;
//!
//! # async fn example() -> PgResult<()> {
//! let config = PgConfig::new("postgresql://localhost/entrylog");
//! let client = PgClient::new(config)?;
//! let mut conn = client.get_connection(ReadIntent::ReadOnly).await?;
//! # Ok(())
//! # }
//! ```

// Common query traits
pub use diesel::prelude::*;
pub use diesel_async::RunQueryDsl;

// Connection and client types
pub use crate::PgConnection;
pub use crate::client::{
    ConnectionPool, PgClient, PgConfig, PgConn, PgPoolStatus, PoolRole, ReadIntent,
};
// Repository traits
pub use crate::query::EntryRepository;
// Pagination types
pub use crate::types::{
    CursorPage, CursorPageRequest, EntryCursor, Navigation, OffsetPage, OffsetPageRequest,
};
// Error types
pub use crate::{PgError, PgResult};
