//! # Repository Module
//!
//! Database repository implementations for the pet store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Call, One Transaction                            │
//! │                                                                         │
//! │  repo.update(UpdatePet { id, name, description })                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  client.get_connection()  ── NotInitialized / ShutDown                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  executor.begin()         ── PoolExhausted after DB_ACQUIRE_TIMEOUT    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx.exec(UPDATE_PET)      ── Query error ──► tx.rollback() ──► Err     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx.commit() ──► Ok(rows affected)                                     │
//! │                                                                         │
//! │  No retries: the caller decides what a failure means.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PetRepository`] / [`pet::SqlPetRepository`] - pet search and CRUD

pub mod pet;

use async_trait::async_trait;
use petstore_core::{DeletePet, InsertPet, Pet, UpdatePet};
use uuid::Uuid;

use crate::error::DbResult;

/// Pet persistence operations.
#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Empty `filter` returns every pet; otherwise the pet whose id equals it.
    async fn search(&self, filter: &str) -> DbResult<Vec<Pet>>;

    /// Inserts a pet and returns the id that was stored.
    async fn insert(&self, pet: InsertPet) -> DbResult<String>;

    /// Replaces name and description. Returns rows affected.
    async fn update(&self, pet: UpdatePet) -> DbResult<i64>;

    /// Returns rows affected.
    async fn delete(&self, pet: DeletePet) -> DbResult<i64>;
}

/// Generates a new pet identifier (UUID v4, hyphenated lowercase).
pub fn generate_pet_id() -> String {
    Uuid::new_v4().to_string()
}
