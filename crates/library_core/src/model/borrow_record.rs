//! Circulation records: one row per lent copy.
//!
//! # Invariants
//! - A record is open iff `returned_at` is `None`.
//! - `borrowed_at` is set by the store at creation and never changes.
//! - `returned_at` is written exactly once.

use super::book::BookId;
use super::borrower::BorrowerId;
use super::{require_id, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned borrow record identifier.
pub type BorrowRecordId = i64;

/// Lifecycle state derived from `returned_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Copy is out with the borrower.
    Open,
    /// Copy came back; terminal.
    Closed,
}

/// One lending of one copy of a book to one borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: BorrowRecordId,
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    /// Unix epoch milliseconds.
    pub borrowed_at: i64,
    pub due_date: Option<NaiveDate>,
    /// Unix epoch milliseconds; `None` while the copy is out.
    pub returned_at: Option<i64>,
}

impl BorrowRecord {
    pub fn state(&self) -> RecordState {
        match self.returned_at {
            None => RecordState::Open,
            Some(_) => RecordState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == RecordState::Open
    }
}

/// Open record joined with the catalog fields shown to the borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBorrow {
    pub record_id: BorrowRecordId,
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub borrowed_at: i64,
    pub due_date: Option<NaiveDate>,
}

/// Input for lending one copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowRequest {
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub due_date: Option<NaiveDate>,
}

impl BorrowRequest {
    pub fn new(book_id: BookId, borrower_id: BorrowerId) -> Self {
        Self {
            book_id,
            borrower_id,
            due_date: None,
        }
    }

    pub fn due_on(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id("book_id", self.book_id)?;
        require_id("borrower_id", self.borrower_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{BorrowRecord, BorrowRequest, RecordState};
    use crate::model::ValidationError;

    fn record(returned_at: Option<i64>) -> BorrowRecord {
        BorrowRecord {
            id: 1,
            book_id: 2,
            borrower_id: 3,
            borrowed_at: 1_000,
            due_date: None,
            returned_at,
        }
    }

    #[test]
    fn state_follows_returned_at() {
        assert_eq!(record(None).state(), RecordState::Open);
        assert!(record(None).is_open());
        assert_eq!(record(Some(2_000)).state(), RecordState::Closed);
    }

    #[test]
    fn request_rejects_missing_ids() {
        assert_eq!(
            BorrowRequest::new(0, 1).validate(),
            Err(ValidationError::InvalidId {
                field: "book_id",
                value: 0
            })
        );
        assert!(BorrowRequest::new(1, -1).validate().is_err());
        assert!(BorrowRequest::new(1, 1).validate().is_ok());
    }
}
