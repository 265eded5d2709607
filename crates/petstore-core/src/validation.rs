//! # Validation Module
//!
//! Request validation for the pet store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (THIS MODULE)                                         │
//! │  ├── name present and non-empty                                        │
//! │  └── id present for update/delete, length and format checks            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (petstore-db)                                     │
//! │  └── no re-validation, binds values as parameters                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                        │
//! │  ├── NOT NULL on name                                                  │
//! │  └── PRIMARY KEY on id                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use petstore_core::validation::{validate_pet_name, is_uuid_v4};
//!
//! assert!(validate_pet_name("Rex").is_ok());
//! assert!(validate_pet_name("   ").is_err());
//! assert!(!is_uuid_v4("not-a-uuid"));
//! ```

use uuid::{Uuid, Version};

use crate::error::ValidationError;
use crate::types::{DeletePet, InsertPet, UpdatePet};
use crate::{MAX_DESCRIPTION_LEN, MAX_ID_LEN, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a pet name.
///
/// ## Rules
/// - Must not be empty or whitespace only
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_pet_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::too_long("name", MAX_NAME_LEN));
    }

    Ok(())
}

/// Validates an optional description. `None` is always valid.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(
            ValidationError::too_long("description", MAX_DESCRIPTION_LEN),
        ),
        _ => Ok(()),
    }
}

/// Validates a pet id used as a row selector.
///
/// Ids are opaque strings; generated ones are UUIDv4 but caller-supplied ids
/// need not be.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_ID_LEN`] characters
/// - No whitespace or control characters
pub fn validate_pet_id(id: &str) -> ValidationResult<()> {
    if id.is_empty() {
        return Err(ValidationError::required("id"));
    }

    if id.chars().count() > MAX_ID_LEN {
        return Err(ValidationError::too_long("id", MAX_ID_LEN));
    }

    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must not contain whitespace or control characters".to_string(),
        });
    }

    Ok(())
}

/// Returns true if `id` is a hyphenated, version 4 UUID.
pub fn is_uuid_v4(id: &str) -> bool {
    // Uuid::parse_str also accepts simple/braced/urn forms; generated ids are
    // always the 36-char hyphenated form.
    id.len() == 36
        && Uuid::parse_str(id)
            .map(|uuid| uuid.get_version() == Some(Version::Random))
            .unwrap_or(false)
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates an insert request. An absent or empty id is allowed.
pub fn validate_insert(request: &InsertPet) -> ValidationResult<()> {
    if let Some(id) = request.supplied_id() {
        validate_pet_id(id)?;
    }
    validate_pet_name(&request.name)?;
    validate_description(request.description.as_deref())
}

/// Validates an update request.
pub fn validate_update(request: &UpdatePet) -> ValidationResult<()> {
    validate_pet_id(&request.id)?;
    validate_pet_name(&request.name)?;
    validate_description(request.description.as_deref())
}

/// Validates a delete request.
pub fn validate_delete(request: &DeletePet) -> ValidationResult<()> {
    validate_pet_id(&request.id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pet_name() {
        assert!(validate_pet_name("Rex").is_ok());
        assert_eq!(
            validate_pet_name(""),
            Err(ValidationError::required("name"))
        );
        assert!(validate_pet_name("  \t").is_err());
        assert!(validate_pet_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_pet_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some("")).is_ok());
        assert!(validate_description(Some(&"d".repeat(MAX_DESCRIPTION_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_pet_id() {
        assert!(validate_pet_id("2f1c6b8e-4d5a-4c3b-9a7e-1f2d3c4b5a69").is_ok());
        assert!(validate_pet_id("pet-42").is_ok());
        assert!(validate_pet_id("").is_err());
        assert!(validate_pet_id("has space").is_err());
        assert!(validate_pet_id(&"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_is_uuid_v4() {
        assert!(is_uuid_v4(&Uuid::new_v4().to_string()));
        // version 1 UUID
        assert!(!is_uuid_v4("c232ab00-9414-11ec-b3c8-9f6bdeced846"));
        assert!(!is_uuid_v4(&Uuid::new_v4().simple().to_string()));
        assert!(!is_uuid_v4("pet-42"));
    }

    #[test]
    fn test_validate_requests() {
        assert!(validate_insert(&InsertPet::new("Rex")).is_ok());
        assert!(validate_insert(&InsertPet::new("Rex").with_id("")).is_ok());
        assert!(validate_insert(&InsertPet::new("")).is_err());
        assert!(validate_insert(&InsertPet::new("Rex").with_id("bad id")).is_err());

        assert!(validate_update(&UpdatePet::new("u1", "Max", None)).is_ok());
        let err = validate_update(&UpdatePet::new("", "Max", None)).unwrap_err();
        assert_eq!(err.field(), "id");

        assert!(validate_delete(&DeletePet::new("u1")).is_ok());
        assert!(validate_delete(&DeletePet::new("")).is_err());
    }
}
