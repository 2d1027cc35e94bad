//! Catalog use-case service.
//!
//! # Responsibility
//! - Add, update, delete, read and list books.
//! - Normalize caller input before it reaches the repository.
//!
//! # Invariants
//! - A new book starts with every copy available.
//! - `update_book` replaces `quantity` without reconciling `available`;
//!   shrinking below the shelf count is allowed and left as is.

use crate::model::book::{Book, BookId, BookUpdate, NewBook};
use crate::model::EntityKind;
use crate::repo::book_repo::BookRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::report;
use log::info;

const MODULE: &str = "catalog";

/// Use-case service over a book repository.
pub struct CatalogService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Catalogues a new book and returns the stored row.
    ///
    /// # Errors
    /// - `Validation` when title/author is blank or quantity < 1.
    /// - `Conflict` when the isbn is already catalogued.
    pub fn add_book(&self, book: NewBook) -> ServiceResult<Book> {
        let book = book
            .normalize()
            .map_err(|err| report("book_add", MODULE, err.into()))?;
        let id = self
            .repo
            .create_book(&book)
            .map_err(|err| report("book_add", MODULE, err.into()))?;

        info!(
            "event=book_add module={MODULE} status=ok book_id={id} quantity={}",
            book.copies()
        );
        self.get_book(id)
    }

    pub fn get_book(&self, id: BookId) -> ServiceResult<Book> {
        self.repo
            .get_book(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Book, id))
    }

    /// Replaces title, author and quantity of an existing book.
    ///
    /// `available` is left untouched, so it may exceed the new quantity.
    pub fn update_book(&self, id: BookId, update: BookUpdate) -> ServiceResult<Book> {
        let update = update
            .normalize()
            .map_err(|err| report("book_update", MODULE, err.into()))?;
        self.repo
            .update_book(id, &update)
            .map_err(|err| report("book_update", MODULE, err.into()))?;

        let book = self.get_book(id)?;
        if book.available > book.quantity {
            info!(
                "event=book_update module={MODULE} status=ok book_id={id} quantity={} available={} counters=diverged",
                book.quantity, book.available
            );
        } else {
            info!("event=book_update module={MODULE} status=ok book_id={id}");
        }
        Ok(book)
    }

    /// Deletes a book together with its borrow records.
    pub fn delete_book(&self, id: BookId) -> ServiceResult<()> {
        self.repo
            .delete_book(id)
            .map_err(|err| report("book_delete", MODULE, err.into()))?;
        info!("event=book_delete module={MODULE} status=ok book_id={id}");
        Ok(())
    }

    /// Lists all books ordered by title.
    pub fn list_books(&self) -> ServiceResult<Vec<Book>> {
        Ok(self.repo.list_books()?)
    }
}
