use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use deadpool::managed::{Hook, Pool};
use derive_more::{Deref, DerefMut};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};
use diesel_async::scoped_futures::ScopedBoxFuture;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};

use super::custom_hooks;
use crate::{
    ConnectionPool, ErrorHint, PgConfig, PgError, PgResult, PooledConnection,
    TRACING_TARGET_CONNECTION,
};

/// Declared intent of the work a connection is acquired for.
///
/// The intent is passed explicitly on every acquisition; there is no ambient
/// or thread-bound transaction state to consult. The routing decision is
/// re-evaluated per acquisition, since the same logical request may span
/// units of work with different intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReadIntent {
    /// The caller may write; route to the primary.
    ReadWrite,
    /// The caller only reads; route to the replica when one exists.
    ReadOnly,
}

impl ReadIntent {
    /// Returns whether this intent is read-only.
    pub fn is_read_only(&self) -> bool {
        matches!(self, ReadIntent::ReadOnly)
    }
}

/// Identity of the pool a connection was drawn from.
///
/// Tagged onto every [`PgConn`] so the routing outcome is observable for
/// diagnostics; the tag never alters query semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PoolRole {
    /// The read-write primary pool.
    Primary,
    /// The read-only replica pool.
    Replica,
}

impl PoolRole {
    /// Selects the pool for an acquisition.
    ///
    /// Pure function of the intent and replica availability: read-only work
    /// goes to the replica when one is configured, everything else to the
    /// primary.
    pub fn select(intent: ReadIntent, has_replica: bool) -> Self {
        if intent.is_read_only() && has_replica {
            PoolRole::Replica
        } else {
            PoolRole::Primary
        }
    }
}

/// Connection pool status information.
#[derive(Debug, Clone)]
pub struct PgPoolStatus {
    /// Maximum number of connections in the pool
    pub max_size: usize,
    /// Current number of connections in the pool
    pub size: usize,
    /// Number of available connections
    pub available: usize,
    /// Number of requests waiting for connections
    pub waiting: usize,
}

impl PgPoolStatus {
    fn from_pool(pool: &ConnectionPool) -> Self {
        let status = pool.status();
        Self {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Returns the utilization percentage of the pool (0.0 to 1.0).
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            (self.size - self.available) as f64 / self.max_size as f64
        }
    }

    /// Returns whether the pool is under pressure (high utilization or waiting requests).
    #[inline]
    pub fn is_under_pressure(&self) -> bool {
        self.waiting > 0 || self.utilization() > 0.8
    }
}

/// High-level database client that manages the primary and replica pools.
///
/// This struct provides the main interface for connection acquisition,
/// encapsulating pool management, configuration and intent-based routing.
/// Cloning is cheap; clones share the same pools.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

/// Inner data for PgClient
struct PgClientInner {
    primary: ConnectionPool,
    replica: Option<ConnectionPool>,
    config: PgConfig,
}

impl PgClient {
    /// Creates a new database client with the provided configuration.
    ///
    /// This will establish the primary connection pool, and a replica pool
    /// when a replica URL is configured. Replica connections default to
    /// read-only transactions at the session level.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a pool cannot be
    /// built.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CONNECTION,
        fields(database_url = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        tracing::info!(target: TRACING_TARGET_CONNECTION, "Initializing database client");

        config.validate()?;

        let primary = Self::build_pool(config.database_url(), &config, PoolRole::Primary)?;
        let replica = config
            .replica_url()
            .map(|url| Self::build_pool(url, &config, PoolRole::Replica))
            .transpose()?;

        Ok(Self {
            inner: Arc::new(PgClientInner {
                primary,
                replica,
                config,
            }),
        })
    }

    /// Creates a new database client and verifies connectivity.
    ///
    /// On top of [`PgClient::new`], this acquires one connection from each
    /// configured pool and runs a trivial query through it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a pool cannot be
    /// built, or a connectivity test fails.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CONNECTION,
        fields(database_url = %config.database_url_masked())
    )]
    pub async fn new_with_test(config: PgConfig) -> PgResult<Self> {
        let this = Self::new(config)?;

        tracing::debug!(target: TRACING_TARGET_CONNECTION, "Testing database connectivity");
        this.probe(&this.inner.primary, PoolRole::Primary).await?;
        if let Some(replica) = &this.inner.replica {
            this.probe(replica, PoolRole::Replica).await?;
        }

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            max_connections = this.inner.config.postgres_max_connections,
            has_replica = this.inner.replica.is_some(),
            "Database client initialized successfully"
        );

        Ok(this)
    }

    fn build_pool(url: &str, config: &PgConfig, role: PoolRole) -> PgResult<ConnectionPool> {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = match role {
            PoolRole::Primary => Box::new(custom_hooks::setup_callback),
            PoolRole::Replica => Box::new(custom_hooks::setup_read_only_callback),
        };
        let manager = AsyncDieselConnectionManager::new_with_config(url, manager_config);

        Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(Some(config.connection_timeout()))
            .create_timeout(Some(config.connection_timeout()))
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_create(Hook::sync_fn(custom_hooks::post_create))
            .pre_recycle(Hook::sync_fn(custom_hooks::pre_recycle))
            .post_recycle(Hook::sync_fn(custom_hooks::post_recycle))
            .build()
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    role = %role,
                    error = %e,
                    "Failed to create connection pool"
                );
                PgError::Unexpected(format!("Failed to build {role} connection pool: {e}").into())
            })
    }

    async fn probe(&self, pool: &ConnectionPool, role: PoolRole) -> PgResult<()> {
        #[derive(diesel::QueryableByName)]
        struct ConnectivityTest {
            #[diesel(sql_type = diesel::sql_types::Integer)]
            #[allow(dead_code)]
            result: i32,
        }

        let mut conn: PooledConnection = pool.get().await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                role = %role,
                error = %e,
                "Failed to get connection from pool during initialization"
            );
            PgError::from(e)
        })?;

        let _: ConnectivityTest = diesel::sql_query("SELECT 1 as result")
            .get_result(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    role = %role,
                    error = %e,
                    "Database connectivity test failed"
                );
                PgError::from(e)
            })?;

        Ok(())
    }

    /// Gets a connection routed by the declared intent.
    ///
    /// Read-only intent is served from the replica pool when one is
    /// configured, falling back to the primary otherwise; read-write intent
    /// always uses the primary. The returned [`PgConn`] is tagged with the
    /// pool it came from and implements the repository traits. This method
    /// will wait up to the configured timeout for an available connection.
    ///
    /// # Errors
    ///
    /// Returns [`PgError::Timeout`] if no connection is available within the
    /// timeout period.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub async fn get_connection(&self, intent: ReadIntent) -> PgResult<PgConn> {
        let role = PoolRole::select(intent, self.inner.replica.is_some());
        let pool = match role {
            PoolRole::Primary => &self.inner.primary,
            PoolRole::Replica => self.inner.replica.as_ref().unwrap_or(&self.inner.primary),
        };

        tracing::debug!(
            target: TRACING_TARGET_CONNECTION,
            intent = %intent,
            role = %role,
            "Acquiring connection from pool"
        );

        let start = std::time::Instant::now();
        let conn = pool.get().await.map_err(|e| {
            let error = PgError::from(e);
            if let PgError::Timeout(timeout) = &error {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    role = %role,
                    elapsed = ?start.elapsed(),
                    hint = %timeout.hint(),
                    "Timed out acquiring connection from pool"
                );
            } else {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    role = %role,
                    error = %error,
                    elapsed = ?start.elapsed(),
                    "Failed to acquire connection from pool"
                );
            }
            error
        })?;

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(100) {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                role = %role,
                elapsed = ?elapsed,
                "Connection acquisition took longer than expected"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET_CONNECTION,
            role = %role,
            elapsed = ?elapsed,
            "Connection acquired successfully"
        );
        Ok(PgConn::new(conn, role))
    }

    /// Gets the current status of the primary pool.
    #[inline]
    pub fn primary_status(&self) -> PgPoolStatus {
        PgPoolStatus::from_pool(&self.inner.primary)
    }

    /// Gets the current status of the replica pool, if one is configured.
    #[inline]
    pub fn replica_status(&self) -> Option<PgPoolStatus> {
        self.inner.replica.as_ref().map(PgPoolStatus::from_pool)
    }

    /// Gets the database configuration used by this client.
    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primary = self.primary_status();
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .field("replica_url", &self.inner.config.replica_url_masked())
            .field("primary_size", &primary.size)
            .field("primary_available", &primary.available)
            .field("replica", &self.replica_status().map(|s| s.size))
            .finish()
    }
}

/// A wrapper around a pooled database connection.
///
/// `PgConn` owns a connection obtained from one of the pools, remembers
/// which pool it came from, and implements the repository traits (e.g.
/// [`EntryRepository`]) via [`Deref`] to the underlying
/// [`AsyncPgConnection`]. When dropped, the connection is automatically
/// returned to its pool.
///
/// # Usage
///
/// Obtain a `PgConn` from [`PgClient::get_connection`] and use it to execute
/// database operations through the repository traits.
///
/// ```ignore
/// let mut conn = client.get_connection(ReadIntent::ReadOnly).await?;
/// let entry = conn.find_entry_by_id(entry_id).await?;
/// ```
///
/// [`EntryRepository`]: crate::query::EntryRepository
/// [`PgClient::get_connection`]: crate::PgClient::get_connection
/// [`AsyncPgConnection`]: crate::PgConnection
#[derive(Deref, DerefMut)]
pub struct PgConn {
    #[deref]
    #[deref_mut]
    conn: PooledConnection,
    role: PoolRole,
}

impl PgConn {
    /// Creates a new connection wrapper from a pooled connection.
    pub fn new(conn: PooledConnection, role: PoolRole) -> Self {
        Self { conn, role }
    }

    /// Returns which pool this connection was drawn from.
    pub fn role(&self) -> PoolRole {
        self.role
    }

    /// Executes the given function within a database transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If the function returns `Err`, the transaction is rolled back.
    /// A write attempted on a replica connection fails inside the store and
    /// surfaces through the returned error, it is never downgraded.
    ///
    /// # Example
    ///
    /// ```ignore
    /// conn.transaction(|conn| {
    ///     Box::pin(async move {
    ///         let entry_id = conn.next_entry_id().await?;
    ///         conn.insert_entry(build_entry(entry_id)).await?;
    ///         Ok(entry_id)
    ///     })
    /// }).await?;
    /// ```
    pub async fn transaction<'a, T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: for<'r> FnOnce(&'r mut PooledConnection) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
            + Send
            + 'a,
        T: Send + 'a,
        E: From<diesel::result::Error> + Send + 'a,
    {
        self.conn.transaction(f).await
    }
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
