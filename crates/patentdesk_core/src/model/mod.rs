//! Domain models for patent filing records.
//!
//! # Responsibility
//! - Define the canonical patent record, its embedded author map and
//!   position list, and uploaded-file references.
//! - Own field-level validation rules shared by every backend.
//!
//! # Invariants
//! - Serialized field names are part of the wire contract with the backing
//!   document store and must round-trip exactly.
//! - Validation failures abort an operation before any store call is made.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod author;
pub mod file_ref;
pub mod patent;
pub mod position;

/// Unified validation error covering every record kind.
#[derive(Debug)]
pub enum ValidationError {
    Patent(patent::PatentValidationError),
    Author(author::AuthorValidationError),
    Position(position::PositionError),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patent(err) => write!(f, "{err}"),
            Self::Author(err) => write!(f, "{err}"),
            Self::Position(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Patent(err) => Some(err),
            Self::Author(err) => Some(err),
            Self::Position(err) => Some(err),
        }
    }
}

impl From<patent::PatentValidationError> for ValidationError {
    fn from(value: patent::PatentValidationError) -> Self {
        Self::Patent(value)
    }
}

impl From<author::AuthorValidationError> for ValidationError {
    fn from(value: author::AuthorValidationError) -> Self {
        Self::Author(value)
    }
}

impl From<position::PositionError> for ValidationError {
    fn from(value: position::PositionError) -> Self {
        Self::Position(value)
    }
}
