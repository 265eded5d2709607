//! # petstore-core: Pet Domain Types
//!
//! This crate holds the single entity of the pet store data-access layer and
//! the request shapes callers use to read and change it. It has zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Petstore Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller (service / CLI)                       │   │
//! │  │    validates InsertPet / UpdatePet / DeletePet                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ petstore-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                   │   │
//! │  │   │   types   │  │   error   │  │ validation│                   │   │
//! │  │   │   Pet     │  │ Validation│  │   rules   │                   │   │
//! │  │   │ InsertPet │  │   Error   │  │   checks  │                   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 petstore-db (Database Layer)                    │   │
//! │  │         PostgreSQL client, migrations, pet repository           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Pet` and its request shapes
//! - [`error`] - Validation error type
//! - [`validation`] - Request validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use petstore_core::{InsertPet, validation::validate_insert};
//!
//! let request = InsertPet::new("Rex").with_description("dog");
//! assert!(validate_insert(&request).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a pet name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a pet description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Maximum length of a caller-supplied pet id.
///
/// Generated ids are hyphenated UUIDs (36 characters); caller-supplied ids
/// may be any opaque string up to this length.
pub const MAX_ID_LEN: usize = 64;
