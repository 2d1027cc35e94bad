//! Scoped write transaction for multi-statement mutations.
//!
//! # Invariants
//! - Transactions start as `IMMEDIATE`: the write lock is taken at `BEGIN`,
//!   so a read-check-write sequence cannot interleave with another writer.
//! - Nothing is published unless `commit()` succeeds. Every other exit
//!   (error, early return, unwind) rolls back.

use super::DbResult;
use log::debug;
use rusqlite::{Connection, DropBehavior, Transaction, TransactionBehavior};
use std::ops::Deref;
use std::time::Instant;

/// Write unit bound to one borrowed connection.
///
/// Derefs to [`Connection`] so statements run inside the transaction.
pub struct ScopedTransaction<'conn> {
    tx: Transaction<'conn>,
    label: &'static str,
    started_at: Instant,
}

impl<'conn> ScopedTransaction<'conn> {
    /// Begins an immediate transaction on `conn`.
    ///
    /// Waits up to the connection busy timeout when another connection holds
    /// the write lock. Fails if `conn` is already inside a transaction.
    pub fn begin(conn: &'conn Connection, label: &'static str) -> DbResult<Self> {
        let mut tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        tx.set_drop_behavior(DropBehavior::Rollback);
        debug!("event=db_tx module=db status=start label={label}");
        Ok(Self {
            tx,
            label,
            started_at: Instant::now(),
        })
    }

    /// Commits all statements executed in this scope.
    ///
    /// A failed commit is rolled back before the error is returned.
    pub fn commit(self) -> DbResult<()> {
        let label = self.label;
        let started_at = self.started_at;
        self.tx.commit()?;
        debug!(
            "event=db_tx module=db status=commit label={label} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Short name of the operation that owns this transaction.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Deref for ScopedTransaction<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::ScopedTransaction;
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn book_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM books;", [], |row| row.get(0))
            .unwrap()
    }

    fn insert_book(conn: &Connection) {
        conn.execute(
            "INSERT INTO books (title, author, quantity, available) VALUES ('T', 'A', 1, 1);",
            [],
        )
        .unwrap();
    }

    #[test]
    fn committed_scope_publishes_writes() {
        let conn = open_db_in_memory().unwrap();
        let tx = ScopedTransaction::begin(&conn, "test_commit").unwrap();
        insert_book(&tx);
        tx.commit().unwrap();

        assert_eq!(book_count(&conn), 1);
    }

    #[test]
    fn dropped_scope_rolls_back() {
        let conn = open_db_in_memory().unwrap();
        {
            let tx = ScopedTransaction::begin(&conn, "test_drop").unwrap();
            insert_book(&tx);
            assert_eq!(book_count(&tx), 1);
        }

        assert_eq!(book_count(&conn), 0);
    }

    #[test]
    fn error_path_rolls_back_partial_writes() {
        let conn = open_db_in_memory().unwrap();

        let result: Result<(), rusqlite::Error> = (|| {
            let tx = ScopedTransaction::begin(&conn, "test_error").unwrap();
            insert_book(&tx);
            tx.execute("UPDATE books SET available = -1;", [])?;
            tx.commit().unwrap();
            Ok(())
        })();

        assert!(result.is_err());
        assert_eq!(book_count(&conn), 0);
    }

    #[test]
    fn panic_inside_scope_rolls_back() {
        let conn = open_db_in_memory().unwrap();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let tx = ScopedTransaction::begin(&conn, "test_panic").unwrap();
            insert_book(&tx);
            panic!("abort mid-transaction");
        }));

        assert!(outcome.is_err());
        assert_eq!(book_count(&conn), 0);
    }

    #[test]
    fn nested_scope_is_rejected() {
        let conn = open_db_in_memory().unwrap();
        let outer = ScopedTransaction::begin(&conn, "outer").unwrap();

        assert!(ScopedTransaction::begin(&outer, "inner").is_err());
        assert_eq!(outer.label(), "outer");
    }
}
