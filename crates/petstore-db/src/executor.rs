//! # Transactional Query Interface
//!
//! The narrow surface the repository drives: open a transaction, run
//! parameterized statements inside it, then commit or roll back.
//!
//! ## Why Not Hand Out the Pool?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbClient::get_connection()                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Arc<dyn QueryExecutor>  ── begin() ──►  Box<dyn QueryTransaction>     │
//! │       │                                   ├── query(&Statement)        │
//! │       │                                   ├── exec(&Statement)         │
//! │       │                                   ├── commit()                 │
//! │       │                                   └── rollback()               │
//! │       │                                                                 │
//! │  PgExecutor (PgPool)                     PgQueryTransaction            │
//! │                                          (sqlx::Transaction, rolls     │
//! │                                           back on drop)                │
//! │                                                                         │
//! │  The repository never sees a concrete pool type; tests substitute an   │
//! │  in-memory executor.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Statement & Row
// =============================================================================

/// A static SQL text with positional (`$1`, `$2`, ...) text parameters.
///
/// Values are always bound, never spliced into the SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: &'static str,
    pub params: Vec<Option<String>>,
}

impl Statement {
    pub fn new(sql: &'static str) -> Self {
        Statement {
            sql,
            params: Vec::new(),
        }
    }

    /// Appends the next positional parameter.
    pub fn bind(mut self, value: impl Into<Option<String>>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// One result row with every column read as nullable text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRow(pub Vec<Option<String>>);

impl TextRow {
    /// The column at `index`, `None` when NULL or out of range.
    pub fn column(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|value| value.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A source of transactions, obtained from [`crate::DbClient::get_connection`].
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Acquires a connection and opens a transaction on it.
    ///
    /// ## Errors
    /// [`DbError::PoolExhausted`] when no connection frees up within the
    /// acquire timeout.
    async fn begin(&self) -> DbResult<Box<dyn QueryTransaction>>;
}

/// An open transaction holding one connection.
///
/// Dropping it without calling [`QueryTransaction::commit`] rolls back.
#[async_trait]
pub trait QueryTransaction: Send {
    /// Runs a row-returning statement.
    async fn query(&mut self, statement: &Statement) -> DbResult<Vec<TextRow>>;

    /// Runs a statement and returns the affected row count.
    async fn exec(&mut self, statement: &Statement) -> DbResult<u64>;

    async fn commit(self: Box<Self>) -> DbResult<()>;

    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

// =============================================================================
// PostgreSQL Implementation
// =============================================================================

/// [`QueryExecutor`] over a shared `PgPool`.
///
/// Cloning is cheap; every clone draws from the same pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        PgExecutor { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn begin(&self) -> DbResult<Box<dyn QueryTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::query("begin", e))?;
        Ok(Box::new(PgQueryTransaction { tx }))
    }
}

/// A live `sqlx` transaction on one pooled connection.
pub struct PgQueryTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgQueryTransaction {
    fn prepare(
        statement: &Statement,
    ) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
        debug!(
            sql = statement.sql,
            params = statement.params.len(),
            "Executing statement"
        );
        statement
            .params
            .iter()
            .fold(sqlx::query(statement.sql), |query, param| {
                query.bind(param.as_deref())
            })
    }
}

#[async_trait]
impl QueryTransaction for PgQueryTransaction {
    async fn query(&mut self, statement: &Statement) -> DbResult<Vec<TextRow>> {
        let rows = Self::prepare(statement)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| DbError::query("query", e))?;

        rows.iter()
            .map(text_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::query("decode", e))
    }

    async fn exec(&mut self, statement: &Statement) -> DbResult<u64> {
        let result = Self::prepare(statement)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DbError::query("exec", e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx.commit().await.map_err(|e| DbError::query("commit", e))
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::query("rollback", e))
    }
}

fn text_row(row: &PgRow) -> Result<TextRow, sqlx::Error> {
    (0..row.len())
        .map(|index| row.try_get::<Option<String>, _>(index))
        .collect::<Result<Vec<_>, _>>()
        .map(TextRow)
}
