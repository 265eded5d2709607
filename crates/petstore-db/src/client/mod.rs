//! # Database Client
//!
//! Owns the connection pool and its lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Uninitialized ──start()──► Started ──shutdown()──► ShutDown          │
//! │        │  ▲                    │  ▲                      │              │
//! │        │  └─ start() failed    │  └─ start() again       │              │
//! │        │     (stays here)      │     (no-op)             │              │
//! │        ▼                       ▼                         ▼              │
//! │  get_connection()       get_connection()          get_connection()     │
//! │  → NotInitialized       → Arc<dyn QueryExecutor>  → ShutDown           │
//! │                                                                         │
//! │   There is no way back from ShutDown; build a new client instead.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every client owns exactly one pool. Nothing is process-global, so tests
//! and embedders can run as many isolated clients as they like.

pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DbResult;
use crate::executor::QueryExecutor;
use crate::migrations::MigrationReport;

pub use postgres::{PgClient, PoolStatus};

/// Where a client is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Started,
    ShutDown,
}

/// Connection pool owner handed to repositories.
#[async_trait]
pub trait DbClient: Send + Sync {
    /// Establishes the pool. Calling it again once started does nothing.
    async fn start(&self) -> DbResult<()>;

    /// Closes the pool and releases every connection.
    async fn shutdown(&self) -> DbResult<()>;

    /// A handle onto the shared pool for one or more transactions.
    async fn get_connection(&self) -> DbResult<Arc<dyn QueryExecutor>>;

    /// Steps migrations by a signed count relative to the current version.
    async fn run_migration(&self, steps: i64) -> DbResult<MigrationReport>;

    /// Runs the configured liveness statement and returns its scalar.
    async fn validation_query(&self) -> DbResult<i64>;

    async fn state(&self) -> ClientState;
}
