//! Borrower repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `name` (case-insensitive), then `id`.
//! - Deleting a borrower cascades to their borrow records through the store FK.

use super::{ensure_connection_ready, map_unique_violation, RepoError, RepoResult};
use crate::model::borrower::{Borrower, BorrowerId, BorrowerInput};
use crate::model::EntityKind;
use rusqlite::{params, Connection, OptionalExtension, Row};

const BORROWER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    phone,
    created_at
FROM borrowers";

/// Repository interface for the borrower registry.
pub trait BorrowerRepository {
    fn create_borrower(&self, borrower: &BorrowerInput) -> RepoResult<BorrowerId>;
    fn get_borrower(&self, id: BorrowerId) -> RepoResult<Option<Borrower>>;
    fn update_borrower(&self, id: BorrowerId, borrower: &BorrowerInput) -> RepoResult<()>;
    fn delete_borrower(&self, id: BorrowerId) -> RepoResult<()>;
    fn list_borrowers(&self) -> RepoResult<Vec<Borrower>>;
}

/// SQLite-backed borrower repository.
pub struct SqliteBorrowerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBorrowerRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["borrowers"])?;
        Ok(Self { conn })
    }
}

impl BorrowerRepository for SqliteBorrowerRepository<'_> {
    fn create_borrower(&self, borrower: &BorrowerInput) -> RepoResult<BorrowerId> {
        borrower.validate()?;

        self.conn
            .execute(
                "INSERT INTO borrowers (name, email, phone) VALUES (?1, ?2, ?3);",
                params![
                    borrower.name.as_str(),
                    borrower.email.as_deref(),
                    borrower.phone.as_deref(),
                ],
            )
            .map_err(|err| map_unique_violation(err, "email", borrower.email.as_deref()))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_borrower(&self, id: BorrowerId) -> RepoResult<Option<Borrower>> {
        let borrower = self
            .conn
            .query_row(
                &format!("{BORROWER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_borrower_row,
            )
            .optional()?;
        Ok(borrower)
    }

    fn update_borrower(&self, id: BorrowerId, borrower: &BorrowerInput) -> RepoResult<()> {
        borrower.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE borrowers
                 SET
                    name = ?2,
                    email = ?3,
                    phone = ?4
                 WHERE id = ?1;",
                params![
                    id,
                    borrower.name.as_str(),
                    borrower.email.as_deref(),
                    borrower.phone.as_deref(),
                ],
            )
            .map_err(|err| map_unique_violation(err, "email", borrower.email.as_deref()))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Borrower,
                id,
            });
        }
        Ok(())
    }

    fn delete_borrower(&self, id: BorrowerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM borrowers WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Borrower,
                id,
            });
        }
        Ok(())
    }

    fn list_borrowers(&self) -> RepoResult<Vec<Borrower>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BORROWER_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let borrowers = stmt
            .query_map([], read_borrower_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(borrowers)
    }
}

fn read_borrower_row(row: &Row<'_>) -> rusqlite::Result<Borrower> {
    Ok(Borrower {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}
