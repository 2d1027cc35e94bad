//! Book repository contract and SQLite implementation.
//!
//! # Invariants
//! - A created book starts with `available = quantity`.
//! - `update_book` never touches `available`.
//! - Deleting a book cascades to its borrow records through the store FK.

use super::{ensure_connection_ready, map_unique_violation, RepoError, RepoResult};
use crate::model::book::{Book, BookId, BookUpdate, NewBook};
use crate::model::EntityKind;
use rusqlite::{params, Connection, OptionalExtension, Row};

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    author,
    isbn,
    quantity,
    available,
    created_at
FROM books";

/// Repository interface for the book catalog.
pub trait BookRepository {
    fn create_book(&self, book: &NewBook) -> RepoResult<BookId>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn update_book(&self, id: BookId, update: &BookUpdate) -> RepoResult<()>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
    /// Lists every book ordered by title.
    fn list_books(&self) -> RepoResult<Vec<Book>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["books"])?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &NewBook) -> RepoResult<BookId> {
        book.validate()?;

        let copies = book.copies();
        self.conn
            .execute(
                "INSERT INTO books (title, author, isbn, quantity, available)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    book.title.as_str(),
                    book.author.as_str(),
                    book.isbn.as_deref(),
                    copies,
                    copies,
                ],
            )
            .map_err(|err| map_unique_violation(err, "isbn", book.isbn.as_deref()))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        self.conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(read_book_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn update_book(&self, id: BookId, update: &BookUpdate) -> RepoResult<()> {
        update.validate()?;

        let changed = self.conn.execute(
            "UPDATE books
             SET
                title = ?2,
                author = ?3,
                quantity = ?4
             WHERE id = ?1;",
            params![
                id,
                update.title.as_str(),
                update.author.as_str(),
                update.quantity,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Book,
                id,
            });
        }
        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM books WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Book,
                id,
            });
        }
        Ok(())
    }

    fn list_books(&self) -> RepoResult<Vec<Book>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOOK_SELECT_SQL} ORDER BY title COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(read_book_row(row)?);
        }
        Ok(books)
    }
}

fn read_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let id: BookId = row.get("id")?;
    let available: i64 = row.get("available")?;
    if available < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative available `{available}` in books.available for id {id}"
        )));
    }

    Ok(Book {
        id,
        title: row.get("title")?,
        author: row.get("author")?,
        isbn: row.get("isbn")?,
        quantity: row.get("quantity")?,
        available,
        created_at: row.get("created_at")?,
    })
}
