//! Circulation repository: borrow records plus the book counter they move.
//!
//! # Responsibility
//! - Hand out a [`CirculationTx`] unit of work so borrow/return run their
//!   read-check-write steps inside one store transaction.
//! - Provide read models for open and historical borrow records.
//!
//! # Invariants
//! - Every counter mutation is guarded in SQL (`available > 0` for a take,
//!   `returned_at IS NULL` for a close), so a stale read can never push
//!   `available` negative or close a record twice.
//! - A unit of work that is dropped without `commit()` leaves no trace.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::db::ScopedTransaction;
use crate::model::book::BookId;
use crate::model::borrow_record::{ActiveBorrow, BorrowRecord, BorrowRecordId, BorrowRequest};
use crate::model::borrower::BorrowerId;
use crate::model::EntityKind;
use rusqlite::{params, Connection, OptionalExtension, Row};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    book_id,
    borrower_id,
    borrowed_at,
    due_date,
    returned_at
FROM borrow_records";

/// Atomic unit of circulation writes.
///
/// All calls observe and modify one transaction. Nothing is visible to
/// other connections until `commit()`.
pub trait CirculationTx {
    /// Current shelf count, or `None` when the book does not exist.
    fn book_available(&self, book_id: BookId) -> RepoResult<Option<i64>>;
    fn borrower_exists(&self, borrower_id: BorrowerId) -> RepoResult<bool>;
    /// Inserts an open record stamped with the store clock.
    fn insert_open_record(&self, request: &BorrowRequest) -> RepoResult<BorrowRecordId>;
    /// Decrements `available` when positive. Returns `false` if no copy was left.
    fn take_copy(&self, book_id: BookId) -> RepoResult<bool>;
    /// Book id of an open record, or `None` when missing or already closed.
    fn open_record_book(&self, record_id: BorrowRecordId) -> RepoResult<Option<BookId>>;
    /// Stamps `returned_at` on an open record. Returns `false` if it was not open.
    fn close_record(&self, record_id: BorrowRecordId) -> RepoResult<bool>;
    /// Increments `available` with no upper bound check.
    fn restore_copy(&self, book_id: BookId) -> RepoResult<()>;
    fn commit(self) -> RepoResult<()>;
}

/// Repository interface for circulation state.
pub trait CirculationRepository {
    type Tx<'a>: CirculationTx
    where
        Self: 'a;

    /// Opens a unit of work; blocks while another writer holds the store.
    fn begin(&self, label: &'static str) -> RepoResult<Self::Tx<'_>>;
    fn get_record(&self, record_id: BorrowRecordId) -> RepoResult<Option<BorrowRecord>>;
    /// Open records of one borrower, newest first.
    fn list_active_for_borrower(&self, borrower_id: BorrowerId) -> RepoResult<Vec<ActiveBorrow>>;
    /// Every record (open or closed) of one book, newest first.
    fn list_records_for_book(&self, book_id: BookId) -> RepoResult<Vec<BorrowRecord>>;
}

/// SQLite-backed circulation repository.
pub struct SqliteCirculationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCirculationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["books", "borrowers", "borrow_records"])?;
        Ok(Self { conn })
    }
}

impl CirculationRepository for SqliteCirculationRepository<'_> {
    type Tx<'a>
        = SqliteCirculationTx<'a>
    where
        Self: 'a;

    fn begin(&self, label: &'static str) -> RepoResult<SqliteCirculationTx<'_>> {
        let tx = ScopedTransaction::begin(self.conn, label)?;
        Ok(SqliteCirculationTx { tx })
    }

    fn get_record(&self, record_id: BorrowRecordId) -> RepoResult<Option<BorrowRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{RECORD_SELECT_SQL} WHERE id = ?1;"),
                [record_id],
                read_record_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list_active_for_borrower(&self, borrower_id: BorrowerId) -> RepoResult<Vec<ActiveBorrow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                br.id AS record_id,
                br.book_id AS book_id,
                b.title AS title,
                b.author AS author,
                br.borrowed_at AS borrowed_at,
                br.due_date AS due_date
             FROM borrow_records br
             INNER JOIN books b ON b.id = br.book_id
             WHERE br.borrower_id = ?1
               AND br.returned_at IS NULL
             ORDER BY br.borrowed_at DESC, br.id DESC;",
        )?;
        let items = stmt
            .query_map([borrower_id], |row| {
                Ok(ActiveBorrow {
                    record_id: row.get("record_id")?,
                    book_id: row.get("book_id")?,
                    title: row.get("title")?,
                    author: row.get("author")?,
                    borrowed_at: row.get("borrowed_at")?,
                    due_date: row.get("due_date")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn list_records_for_book(&self, book_id: BookId) -> RepoResult<Vec<BorrowRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE book_id = ?1
             ORDER BY borrowed_at DESC, id DESC;"
        ))?;
        let records = stmt
            .query_map([book_id], read_record_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

/// Circulation unit of work over one [`ScopedTransaction`].
pub struct SqliteCirculationTx<'conn> {
    tx: ScopedTransaction<'conn>,
}

impl CirculationTx for SqliteCirculationTx<'_> {
    fn book_available(&self, book_id: BookId) -> RepoResult<Option<i64>> {
        let available = self
            .tx
            .query_row(
                "SELECT available FROM books WHERE id = ?1;",
                [book_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(available)
    }

    fn borrower_exists(&self, borrower_id: BorrowerId) -> RepoResult<bool> {
        let exists: i64 = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM borrowers WHERE id = ?1);",
            [borrower_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_open_record(&self, request: &BorrowRequest) -> RepoResult<BorrowRecordId> {
        request.validate()?;

        self.tx.execute(
            "INSERT INTO borrow_records (book_id, borrower_id, due_date, returned_at)
             VALUES (?1, ?2, ?3, NULL);",
            params![request.book_id, request.borrower_id, request.due_date],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    fn take_copy(&self, book_id: BookId) -> RepoResult<bool> {
        let changed = self.tx.execute(
            "UPDATE books
             SET available = available - 1
             WHERE id = ?1
               AND available > 0;",
            [book_id],
        )?;
        Ok(changed == 1)
    }

    fn open_record_book(&self, record_id: BorrowRecordId) -> RepoResult<Option<BookId>> {
        let book_id = self
            .tx
            .query_row(
                "SELECT book_id
                 FROM borrow_records
                 WHERE id = ?1
                   AND returned_at IS NULL;",
                [record_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(book_id)
    }

    fn close_record(&self, record_id: BorrowRecordId) -> RepoResult<bool> {
        let changed = self.tx.execute(
            "UPDATE borrow_records
             SET returned_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND returned_at IS NULL;",
            [record_id],
        )?;
        Ok(changed == 1)
    }

    fn restore_copy(&self, book_id: BookId) -> RepoResult<()> {
        let changed = self.tx.execute(
            "UPDATE books SET available = available + 1 WHERE id = ?1;",
            [book_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Book,
                id: book_id,
            });
        }
        Ok(())
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn read_record_row(row: &Row<'_>) -> rusqlite::Result<BorrowRecord> {
    Ok(BorrowRecord {
        id: row.get("id")?,
        book_id: row.get("book_id")?,
        borrower_id: row.get("borrower_id")?,
        borrowed_at: row.get("borrowed_at")?,
        due_date: row.get("due_date")?,
        returned_at: row.get("returned_at")?,
    })
}
