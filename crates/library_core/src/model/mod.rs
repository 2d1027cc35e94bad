//! Library domain model: catalog, registry and circulation records.
//!
//! # Invariants
//! - Identifiers are assigned by the store and never reused.
//! - `0 <= available` holds for every persisted book.
//! - A borrow record closes at most once and never reopens.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod book;
pub mod borrow_record;
pub mod borrower;

/// Record kinds managed by the library store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Book,
    Borrower,
    BorrowRecord,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Borrower => "borrower",
            Self::BorrowRecord => "borrow_record",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is missing or blank after trim.
    BlankField(&'static str),
    /// Copy count below one.
    InvalidQuantity(i64),
    /// Referenced id is not a positive store id.
    InvalidId { field: &'static str, value: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} is required"),
            Self::InvalidQuantity(value) => {
                write!(f, "quantity must be at least 1, got {value}")
            }
            Self::InvalidId { field, value } => {
                write!(f, "{field} must be a positive id, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Rejects missing or whitespace-only required text.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Trims optional text, treating blank input as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub(crate) fn require_id(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidId { field, value });
    }
    Ok(())
}
