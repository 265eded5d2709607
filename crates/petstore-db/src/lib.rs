//! # petstore-db: Database Layer for the Pet Store
//!
//! This crate provides PostgreSQL access for pet records: an owned
//! connection pool, runtime schema migrations, and a transactional pet
//! repository.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pet Store Data Flow                              │
//! │                                                                         │
//! │  Caller (HTTP handler, CLI, seed binary)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   petstore-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   PgClient    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │  (client/)    │    │   (pet.rs)    │    │  (runtime)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ PgPool        │◄───│ SqlPetRepo    │    │ 0001.up.sql  │  │   │
//! │  │   │ Lifecycle     │    │ begin/exec/   │    │ 0001.down.sql│  │   │
//! │  │   │ Validation    │    │ commit        │    │ ...          │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL (table `pet`)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `DB_*` environment configuration
//! - [`dsn`] - connection URL parsing and redaction
//! - [`client`] - pool ownership and lifecycle
//! - [`executor`] - the begin/query/exec/commit interface repositories use
//! - [`migrations`] - signed migration stepping
//! - [`repository`] - pet repository
//! - [`error`] - database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use petstore_db::{DbClient, PetRepository, PgClient, SqlPetRepository};
//!
//! let client = Arc::new(PgClient::from_env()?);
//! client.start().await?;
//! client.run_configured_migration().await?;
//!
//! let pets = SqlPetRepository::new(client.clone());
//! let id = pets.insert(InsertPet::new("Rex").with_description("dog")).await?;
//! let found = pets.search(&id).await?;
//!
//! client.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod dsn;
pub mod error;
pub mod executor;
pub mod migrations;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{ClientState, DbClient, PgClient, PoolStatus};
pub use config::{ConfigError, DbConfig};
pub use error::{DbError, DbResult, MigrationWarning};
pub use executor::{PgExecutor, QueryExecutor, QueryTransaction, Statement, TextRow};
pub use migrations::MigrationReport;

// Repository re-exports for convenience
pub use repository::pet::SqlPetRepository;
pub use repository::{generate_pet_id, PetRepository};
