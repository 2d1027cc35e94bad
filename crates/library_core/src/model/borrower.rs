//! Borrower registry model.
//!
//! # Invariants
//! - `name` is never blank.
//! - `email` is unique across borrowers when present.

use super::{optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned borrower identifier.
pub type BorrowerId = i64;

/// Registered library patron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Create/replace input for a borrower.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl BorrowerInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }

    /// Trims the name, drops blank contact fields and validates the result.
    pub fn normalize(self) -> Result<Self, ValidationError> {
        let normalized = Self {
            name: self.name.trim().to_string(),
            email: optional_text(self.email),
            phone: optional_text(self.phone),
        };
        normalized.validate()?;
        Ok(normalized)
    }
}
