//! # Database Error Types
//!
//! Error types for client lifecycle, migration and repository operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Env var (DB_*) ──► ConfigError ──┐                                    │
//! │                                   │                                     │
//! │  PostgreSQL error (sqlx::Error) ──┼──► DbError (this module)           │
//! │                                   │        │                            │
//! │  Client state machine ────────────┘        ▼                            │
//! │                                       Caller (owns retry policy)        │
//! │                                                                         │
//! │  Migration step failure ──► MigrationWarning ──► warn! + report        │
//! │                              (never an Err)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `DB_URL` could not be parsed into connection options.
    ///
    /// This is fatal to the process: the configuration is unusable and no
    /// retry can succeed. See [`DbError::is_fatal`].
    #[error("Invalid database URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The pool could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation needed the pool before `start` succeeded.
    #[error("Database client is not initialized")]
    NotInitialized,

    /// The pool was closed by `shutdown`; a fresh client is required.
    #[error("Database client has been shut down")]
    ShutDown,

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Migrations could not be loaded or the migration connection failed.
    ///
    /// Errors while stepping are not reported here; they surface as a
    /// [`MigrationWarning`] instead.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A statement or transaction control command failed.
    #[error("Query failed during {operation}: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    /// Wraps a driver error raised while performing `operation`.
    ///
    /// Pool errors keep their dedicated variants so callers can tell an
    /// exhausted pool apart from a failing statement.
    pub fn query(operation: &'static str, source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ShutDown,
            source => DbError::Query { operation, source },
        }
    }

    /// Returns true for errors that make the process configuration unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DbError::InvalidUrl { .. } | DbError::Config(_))
    }

    /// Returns true if the database rejected a duplicate primary key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Query {
                source: sqlx::Error::Database(db_err),
                ..
            } => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ShutDown
/// Other                       → DbError::Query
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::query("statement", err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Migration Warning
// =============================================================================

/// A non-fatal problem met while stepping migrations.
///
/// Stepping errors are tolerated: the pool stays usable and the warning is
/// logged and returned in the migration report. Callers must not assume the
/// schema changed when one is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationWarning {
    /// Nothing to apply or revert in the requested direction.
    NoChange,

    /// Fewer migrations were available than steps requested.
    ShortLimit { requested: u64, applied: u64 },

    /// A previous migration failed part-way; the database needs manual repair.
    Dirty { version: i64 },

    /// An applied version has no down script, so it cannot be reverted.
    MissingDownMigration { version: i64 },

    /// A migration script failed.
    Step { version: i64, message: String },

    /// The migrations table or advisory lock could not be used.
    Tracking { message: String },
}

impl fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationWarning::NoChange => write!(f, "no change"),
            MigrationWarning::ShortLimit { requested, applied } => write!(
                f,
                "requested {} steps but only {} were available",
                requested, applied
            ),
            MigrationWarning::Dirty { version } => {
                write!(f, "database is dirty at version {}", version)
            }
            MigrationWarning::MissingDownMigration { version } => {
                write!(f, "no down migration for version {}", version)
            }
            MigrationWarning::Step { version, message } => {
                write!(f, "migration {} failed: {}", version, message)
            }
            MigrationWarning::Tracking { message } => {
                write!(f, "migration tracking failed: {}", message)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
