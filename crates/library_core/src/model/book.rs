//! Book catalog model.
//!
//! # Invariants
//! - `title` and `author` are never blank.
//! - `quantity >= 1`; a new book starts with `available == quantity`.
//! - `isbn` is unique across the catalog when present.

use super::{optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned book identifier.
pub type BookId = i64;

/// Copy count used when the caller omits `quantity`.
pub const DEFAULT_QUANTITY: i64 = 1;

/// Catalogued title with its copy counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    /// Total copies owned.
    pub quantity: i64,
    /// Copies currently on the shelf.
    pub available: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Book {
    /// Returns whether at least one copy can be lent out right now.
    pub fn has_available_copy(&self) -> bool {
        self.available > 0
    }
}

/// Input for cataloguing a new book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    /// `None` means [`DEFAULT_QUANTITY`].
    pub quantity: Option<i64>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: None,
            quantity: None,
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Effective number of copies to catalogue.
    pub fn copies(&self) -> i64 {
        self.quantity.unwrap_or(DEFAULT_QUANTITY)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        validate_quantity(self.copies())
    }

    /// Trims text fields, drops a blank isbn and validates the result.
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let normalized = Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: optional_text(self.isbn),
            quantity: self.quantity,
        };
        normalized.validate()?;
        Ok(normalized)
    }
}

/// Replacement values for an existing book.
///
/// `available` is deliberately absent: updating `quantity` leaves the
/// shelf counter untouched, so the two may diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub quantity: i64,
}

impl BookUpdate {
    pub fn new(title: impl Into<String>, author: impl Into<String>, quantity: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            quantity,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        validate_quantity(self.quantity)
    }

    pub fn normalize(self) -> Result<Self, ValidationError> {
        let normalized = Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            quantity: self.quantity,
        };
        normalized.validate()?;
        Ok(normalized)
    }
}

fn validate_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::InvalidQuantity(quantity));
    }
    Ok(())
}
