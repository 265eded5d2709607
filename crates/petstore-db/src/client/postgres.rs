//! # PostgreSQL Client
//!
//! [`DbClient`] backed by a `sqlx` `PgPool`.
//!
//! ## Pool Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PostgreSQL Connection Pool                         │
//! │                                                                         │
//! │  DbConfig::from_env() ← DB_URL, DB_MAX_CONN, DB_ACQUIRE_TIMEOUT, ...   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PgClient::start() ← parse URL + create pool                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │              PgPool                      │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (DB_MAX_CONN)            │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ One connection per open transaction                            │
//! │       ▼                                                                 │
//! │  Caller 1 ──► Conn1                                                    │
//! │  Caller 2 ──► Conn2                                                    │
//! │  Caller K+1 ──► waits DB_ACQUIRE_TIMEOUT ──► PoolExhausted             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Migrations never borrow a pooled connection: they open their own, see
//! [`crate::migrations`].

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::{ClientState, DbClient};
use crate::config::DbConfig;
use crate::dsn;
use crate::error::{DbError, DbResult};
use crate::executor::{PgExecutor, QueryExecutor};
use crate::migrations::{self, MigrationReport};

/// Pool counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, idle or in use.
    pub size: u32,
    pub idle: usize,
    pub max: u32,
}

enum PoolState {
    Uninitialized,
    Started(PgPool),
    ShutDown,
}

/// PostgreSQL client owning one pool.
///
/// ## Usage
/// ```rust,ignore
/// let client = PgClient::new(DbConfig::from_env()?);
/// client.start().await?;
/// client.run_configured_migration().await?;
///
/// let pets = SqlPetRepository::new(Arc::new(client));
/// ```
pub struct PgClient {
    config: DbConfig,
    state: Mutex<PoolState>,
}

impl std::fmt::Debug for PgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgClient")
            .field("url", &dsn::redacted_url(&self.config.database_url))
            .field("max_connections", &self.config.max_connections)
            .finish_non_exhaustive()
    }
}

impl PgClient {
    pub fn new(config: DbConfig) -> Self {
        PgClient {
            config,
            state: Mutex::new(PoolState::Uninitialized),
        }
    }

    /// Builds a client from `DB_*` environment variables.
    pub fn from_env() -> DbResult<Self> {
        Ok(Self::new(DbConfig::from_env()?))
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Applies `DB_MIGRATION_VERSION` steps.
    pub async fn run_configured_migration(&self) -> DbResult<MigrationReport> {
        self.run_migration(self.config.migration_version).await
    }

    /// `(available, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        self.pool().await?;
        migrations::migration_status(&self.config).await
    }

    /// Current pool counters.
    pub async fn pool_status(&self) -> DbResult<PoolStatus> {
        let pool = self.pool().await?;
        Ok(status_of(&pool))
    }

    /// True when the validation query succeeds.
    pub async fn health_check(&self) -> bool {
        match self.validation_query().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }

    /// The live pool, or the error matching the current state.
    async fn pool(&self) -> DbResult<PgPool> {
        match &*self.state.lock().await {
            PoolState::Started(pool) => Ok(pool.clone()),
            PoolState::Uninitialized => Err(DbError::NotInitialized),
            PoolState::ShutDown => Err(DbError::ShutDown),
        }
    }

    async fn connect(&self) -> DbResult<PgPool> {
        let config = &self.config;
        config.validate()?;

        let url = dsn::connection_url(config)?;
        let options = dsn::connect_options(config)?;
        debug!(
            url = %dsn::redacted_url(&url),
            ssl_mode = config.ssl_mode_name(),
            "Connection options configured"
        );

        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl DbClient for PgClient {
    async fn start(&self) -> DbResult<()> {
        // Held across connect so concurrent starts create one pool.
        let mut state = self.state.lock().await;

        match &*state {
            PoolState::Started(_) => {
                debug!("Database client already started");
                return Ok(());
            }
            PoolState::ShutDown => return Err(DbError::ShutDown),
            PoolState::Uninitialized => {}
        }

        info!(
            url = %dsn::redacted_url(&self.config.database_url),
            max_connections = self.config.max_connections,
            acquire_timeout_secs = self.config.acquire_timeout.as_secs(),
            "Initializing database connection"
        );

        let pool = match self.connect().await {
            Ok(pool) => pool,
            Err(e) => {
                error!(
                    url = %dsn::redacted_url(&self.config.database_url),
                    error = %e,
                    fatal = e.is_fatal(),
                    "Database pool could not be established"
                );
                return Err(e);
            }
        };

        let status = status_of(&pool);
        info!(
            size = status.size,
            idle = status.idle,
            max_connections = status.max,
            "Database pool created"
        );

        *state = PoolState::Started(pool);
        Ok(())
    }

    async fn shutdown(&self) -> DbResult<()> {
        let mut state = self.state.lock().await;

        match std::mem::replace(&mut *state, PoolState::ShutDown) {
            PoolState::Started(pool) => {
                info!("Closing database pool");
                pool.close().await;
                info!("Database pool closed");
                Ok(())
            }
            PoolState::Uninitialized => {
                *state = PoolState::Uninitialized;
                Err(DbError::NotInitialized)
            }
            PoolState::ShutDown => Err(DbError::ShutDown),
        }
    }

    async fn get_connection(&self) -> DbResult<Arc<dyn QueryExecutor>> {
        let pool = self.pool().await?;
        Ok(Arc::new(PgExecutor::new(pool)))
    }

    async fn run_migration(&self, steps: i64) -> DbResult<MigrationReport> {
        self.pool().await?;
        migrations::run_steps(&self.config, steps).await
    }

    async fn validation_query(&self) -> DbResult<i64> {
        let pool = self.pool().await?;
        let query = self.config.validation_query.as_str();

        debug!(sql = query, "Running validation query");

        let row = sqlx::query(query)
            .fetch_one(&pool)
            .await
            .map_err(|e| DbError::query("validation", e))?;

        // SELECT 1 comes back as INT4; wider probes as INT8.
        row.try_get::<i64, _>(0)
            .or_else(|_| row.try_get::<i32, _>(0).map(i64::from))
            .or_else(|_| row.try_get::<i16, _>(0).map(i64::from))
            .map_err(|e| DbError::query("validation", e))
    }

    async fn state(&self) -> ClientState {
        match &*self.state.lock().await {
            PoolState::Uninitialized => ClientState::Uninitialized,
            PoolState::Started(_) => ClientState::Started,
            PoolState::ShutDown => ClientState::ShutDown,
        }
    }
}

fn status_of(pool: &PgPool) -> PoolStatus {
    PoolStatus {
        size: pool.size(),
        idle: pool.num_idle(),
        max: pool.options().get_max_connections(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
