//! # Domain Types
//!
//! The pet entity and the four request shapes that carry subsets of its
//! fields.
//!
//! ## Field Optionality by Shape
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬──────────────────────────┐
//! │  Shape       │  id          │  name        │  description             │
//! ├──────────────┼──────────────┼──────────────┼──────────────────────────┤
//! │  Pet         │  required    │  required    │  optional                │
//! │  InsertPet   │  optional *  │  required    │  optional                │
//! │  UpdatePet   │  required    │  required    │  optional (full replace) │
//! │  DeletePet   │  required    │  -           │  -                       │
//! └──────────────┴──────────────┴──────────────┴──────────────────────────┘
//!   * absent or empty → the repository generates a UUIDv4
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// Pet
// =============================================================================

/// A pet row as stored in the `pet` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pet {
    /// Unique identifier. Immutable once assigned.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-form description.
    pub description: Option<String>,
}

impl Pet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Pet {
            id: id.into(),
            name: name.into(),
            description,
        }
    }
}

// =============================================================================
// Insert
// =============================================================================

/// Request to insert a new pet.
///
/// `id` may be left out; the repository then generates a random UUIDv4 and
/// returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertPet {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl InsertPet {
    /// Creates an insert request without an id or description.
    pub fn new(name: impl Into<String>) -> Self {
        InsertPet {
            id: None,
            name: name.into(),
            description: None,
        }
    }

    /// Sets a caller-chosen id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the caller-supplied id, treating an empty string as absent.
    pub fn supplied_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

// =============================================================================
// Update
// =============================================================================

/// Request to replace `name` and `description` of the pet with `id`.
///
/// This is a full replace: a `None` description clears the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdatePet {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        UpdatePet {
            id: id.into(),
            name: name.into(),
            description,
        }
    }
}

impl From<Pet> for UpdatePet {
    fn from(pet: Pet) -> Self {
        UpdatePet {
            id: pet.id,
            name: pet.name,
            description: pet.description,
        }
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Request to delete the pet with `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePet {
    pub id: String,
}

impl DeletePet {
    pub fn new(id: impl Into<String>) -> Self {
        DeletePet { id: id.into() }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
