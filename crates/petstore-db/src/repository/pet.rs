//! # Pet Repository
//!
//! Database operations for pets.
//!
//! ## Statements
//! ```text
//! ┌──────────┬────────────────────────────────────────────────┬───────────┐
//! │ Call     │ SQL                                            │ Binds     │
//! ├──────────┼────────────────────────────────────────────────┼───────────┤
//! │ search   │ SELECT id, name, description FROM pet          │ -         │
//! │ search   │   ... WHERE id = $1                            │ id        │
//! │ insert   │ INSERT INTO pet (id, name, description) ...    │ id,n,d    │
//! │ update   │ UPDATE pet SET name = $1, description = $2 ... │ n,d,id    │
//! │ delete   │ DELETE FROM pet WHERE id = $1                  │ id        │
//! └──────────┴────────────────────────────────────────────────┴───────────┘
//! ```
//!
//! All SQL is fixed text; values only ever travel as bound parameters.
//! Results come back in database order, there is no `ORDER BY`.

use std::sync::Arc;

use async_trait::async_trait;
use petstore_core::{DeletePet, InsertPet, Pet, UpdatePet};
use tracing::{debug, warn};

use crate::client::DbClient;
use crate::error::{DbError, DbResult};
use crate::executor::{QueryTransaction, Statement, TextRow};
use crate::repository::{generate_pet_id, PetRepository};

pub(crate) const SEARCH_ALL_PETS: &str = "SELECT id, name, description FROM pet";
pub(crate) const SEARCH_PET_BY_ID: &str = "SELECT id, name, description FROM pet WHERE id = $1";
pub(crate) const INSERT_PET: &str = "INSERT INTO pet (id, name, description) VALUES ($1, $2, $3)";
pub(crate) const UPDATE_PET: &str = "UPDATE pet SET name = $1, description = $2 WHERE id = $3";
pub(crate) const DELETE_PET: &str = "DELETE FROM pet WHERE id = $1";

/// [`PetRepository`] over any [`DbClient`].
///
/// Holds no pool of its own; each call borrows a connection from the
/// client for exactly one transaction.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SqlPetRepository::new(client.clone());
///
/// let id = repo.insert(InsertPet::new("Rex").with_description("dog")).await?;
/// let found = repo.search(&id).await?;
/// ```
#[derive(Clone)]
pub struct SqlPetRepository {
    client: Arc<dyn DbClient>,
}

impl SqlPetRepository {
    pub fn new(client: Arc<dyn DbClient>) -> Self {
        SqlPetRepository { client }
    }

    async fn begin(&self) -> DbResult<Box<dyn QueryTransaction>> {
        let executor = self.client.get_connection().await?;
        executor.begin().await
    }

    /// Runs one row-returning statement and maps every row to a pet.
    async fn fetch(&self, operation: &'static str, statement: Statement) -> DbResult<Vec<Pet>> {
        let mut tx = self.begin().await?;
        let result = tx.query(&statement).await.and_then(|rows| {
            rows.iter()
                .map(|row| pet_from_row(operation, row))
                .collect::<DbResult<Vec<_>>>()
        });
        finish(tx, operation, result).await
    }

    /// Runs one statement and returns rows affected.
    async fn execute(&self, operation: &'static str, statement: Statement) -> DbResult<i64> {
        let mut tx = self.begin().await?;
        let result = tx.exec(&statement).await;
        let affected = finish(tx, operation, result).await?;
        Ok(i64::try_from(affected).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl PetRepository for SqlPetRepository {
    async fn search(&self, filter: &str) -> DbResult<Vec<Pet>> {
        debug!(filter = %filter, "Searching pets");

        let statement = if filter.is_empty() {
            Statement::new(SEARCH_ALL_PETS)
        } else {
            Statement::new(SEARCH_PET_BY_ID).bind(filter.to_string())
        };

        let pets = self.fetch("search", statement).await?;

        debug!(count = pets.len(), "Search returned pets");
        Ok(pets)
    }

    async fn insert(&self, pet: InsertPet) -> DbResult<String> {
        let id = match pet.supplied_id() {
            Some(id) => id.to_string(),
            None => generate_pet_id(),
        };

        debug!(id = %id, name = %pet.name, "Inserting pet");

        let statement = Statement::new(INSERT_PET)
            .bind(id.clone())
            .bind(pet.name)
            .bind(pet.description);
        self.execute("insert", statement).await?;

        Ok(id)
    }

    async fn update(&self, pet: UpdatePet) -> DbResult<i64> {
        debug!(id = %pet.id, "Updating pet");

        let statement = Statement::new(UPDATE_PET)
            .bind(pet.name)
            .bind(pet.description)
            .bind(pet.id);
        self.execute("update", statement).await
    }

    async fn delete(&self, pet: DeletePet) -> DbResult<i64> {
        debug!(id = %pet.id, "Deleting pet");

        let statement = Statement::new(DELETE_PET).bind(pet.id);
        self.execute("delete", statement).await
    }
}

/// Commits on success. On failure rolls back and returns the original error.
async fn finish<T>(
    tx: Box<dyn QueryTransaction>,
    operation: &'static str,
    result: DbResult<T>,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

fn pet_from_row(operation: &'static str, row: &TextRow) -> DbResult<Pet> {
    let required = |index: usize, column: &str| {
        row.column(index).map(str::to_string).ok_or_else(|| {
            DbError::query(
                operation,
                sqlx::Error::Decode(format!("pet.{} is NULL", column).into()),
            )
        })
    };

    Ok(Pet {
        id: required(0, "id")?,
        name: required(1, "name")?,
        description: row.column(2).map(str::to_string),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
