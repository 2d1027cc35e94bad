//! Circulation engine: borrow and return transitions.
//!
//! # Responsibility
//! - Move one copy between shelf and borrower, keeping the book counter and
//!   the borrow record in step.
//! - Serve borrower-facing read models for open loans.
//!
//! # Invariants
//! - Each transition runs in exactly one repository unit of work; an error
//!   on any step drops the unit and nothing is applied.
//! - Borrow never takes `available` below zero, even under concurrent callers.
//! - Return closes a record at most once. A missing record and an already
//!   returned record are both reported as `NotFound`.
//! - The engine holds no in-process locks; serialization is the store's job.

use crate::model::book::BookId;
use crate::model::borrow_record::{ActiveBorrow, BorrowRecord, BorrowRecordId, BorrowRequest};
use crate::model::borrower::BorrowerId;
use crate::model::EntityKind;
use crate::repo::circulation_repo::{CirculationRepository, CirculationTx};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::report;
use log::info;

const MODULE: &str = "circulation";

/// Use-case service over a circulation repository.
pub struct CirculationService<R: CirculationRepository> {
    repo: R,
}

impl<R: CirculationRepository> CirculationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lends one copy of `request.book_id` to `request.borrower_id`.
    ///
    /// Returns the id of the new open borrow record.
    ///
    /// # Errors
    /// - `Validation` when either id is not positive.
    /// - `NotFound` when the book or the borrower does not exist.
    /// - `Unavailable` when no copy is on the shelf. Nothing changes.
    pub fn borrow_book(&self, request: BorrowRequest) -> ServiceResult<BorrowRecordId> {
        let record_id = self
            .try_borrow(&request)
            .map_err(|err| report("borrow", MODULE, err))?;
        info!(
            "event=borrow module={MODULE} status=ok record_id={record_id} book_id={} borrower_id={}",
            request.book_id, request.borrower_id
        );
        Ok(record_id)
    }

    /// Closes an open borrow record and puts the copy back on the shelf.
    ///
    /// The shelf counter is incremented without an upper bound check.
    ///
    /// # Errors
    /// - `NotFound` when the record does not exist or is already closed.
    pub fn return_book(&self, record_id: BorrowRecordId) -> ServiceResult<()> {
        let book_id = self
            .try_return(record_id)
            .map_err(|err| report("return", MODULE, err))?;
        info!("event=return module={MODULE} status=ok record_id={record_id} book_id={book_id}");
        Ok(())
    }

    /// Open loans of one borrower joined with book title/author, newest first.
    ///
    /// An unknown borrower simply has no loans.
    pub fn list_active_borrows(&self, borrower_id: BorrowerId) -> ServiceResult<Vec<ActiveBorrow>> {
        Ok(self.repo.list_active_for_borrower(borrower_id)?)
    }

    pub fn get_record(&self, record_id: BorrowRecordId) -> ServiceResult<BorrowRecord> {
        self.repo
            .get_record(record_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::BorrowRecord, record_id))
    }

    /// Lending history of one book, open and closed, newest first.
    pub fn list_book_history(&self, book_id: BookId) -> ServiceResult<Vec<BorrowRecord>> {
        Ok(self.repo.list_records_for_book(book_id)?)
    }

    fn try_borrow(&self, request: &BorrowRequest) -> ServiceResult<BorrowRecordId> {
        request.validate()?;

        let tx = self.repo.begin("borrow")?;
        let available = tx
            .book_available(request.book_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Book, request.book_id))?;
        if available <= 0 {
            return Err(ServiceError::Unavailable(request.book_id));
        }
        if !tx.borrower_exists(request.borrower_id)? {
            return Err(ServiceError::not_found(
                EntityKind::Borrower,
                request.borrower_id,
            ));
        }

        if !tx.take_copy(request.book_id)? {
            return Err(ServiceError::Unavailable(request.book_id));
        }
        let record_id = tx.insert_open_record(request)?;
        tx.commit()?;
        Ok(record_id)
    }

    fn try_return(&self, record_id: BorrowRecordId) -> ServiceResult<BookId> {
        let tx = self.repo.begin("return")?;
        let book_id = tx
            .open_record_book(record_id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::BorrowRecord, record_id))?;
        if !tx.close_record(record_id)? {
            return Err(ServiceError::not_found(
                EntityKind::BorrowRecord,
                record_id,
            ));
        }

        tx.restore_copy(book_id)?;
        tx.commit()?;
        Ok(book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::CirculationService;
    use crate::model::book::BookId;
    use crate::model::borrow_record::{
        ActiveBorrow, BorrowRecord, BorrowRecordId, BorrowRequest,
    };
    use crate::model::borrower::BorrowerId;
    use crate::model::EntityKind;
    use crate::repo::circulation_repo::{CirculationRepository, CirculationTx};
    use crate::repo::{RepoError, RepoResult};
    use crate::service::error::ErrorKind;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FakeRecord {
        id: BorrowRecordId,
        book_id: BookId,
        open: bool,
    }

    /// In-memory store whose writes land only on commit, with optional
    /// failures injected into the record insert and the copy restore.
    #[derive(Default)]
    struct FakeStore {
        available: RefCell<Vec<(BookId, i64)>>,
        records: RefCell<Vec<FakeRecord>>,
        fail_insert: bool,
        fail_restore: bool,
    }

    struct FakeTx<'a> {
        store: &'a FakeStore,
        available: RefCell<Vec<(BookId, i64)>>,
        records: RefCell<Vec<FakeRecord>>,
    }

    impl CirculationTx for FakeTx<'_> {
        fn book_available(&self, book_id: BookId) -> RepoResult<Option<i64>> {
            Ok(self
                .available
                .borrow()
                .iter()
                .find(|(id, _)| *id == book_id)
                .map(|(_, count)| *count))
        }

        fn borrower_exists(&self, _borrower_id: BorrowerId) -> RepoResult<bool> {
            Ok(true)
        }

        fn insert_open_record(&self, request: &BorrowRequest) -> RepoResult<BorrowRecordId> {
            if self.store.fail_insert {
                return Err(RepoError::InvalidData("injected insert failure".to_string()));
            }
            let mut records = self.records.borrow_mut();
            let id = records.len() as BorrowRecordId + 1;
            records.push(FakeRecord {
                id,
                book_id: request.book_id,
                open: true,
            });
            Ok(id)
        }

        fn take_copy(&self, book_id: BookId) -> RepoResult<bool> {
            let mut available = self.available.borrow_mut();
            match available.iter_mut().find(|(id, _)| *id == book_id) {
                Some((_, count)) if *count > 0 => {
                    *count -= 1;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        fn open_record_book(&self, record_id: BorrowRecordId) -> RepoResult<Option<BookId>> {
            Ok(self
                .records
                .borrow()
                .iter()
                .find(|record| record.id == record_id && record.open)
                .map(|record| record.book_id))
        }

        fn close_record(&self, record_id: BorrowRecordId) -> RepoResult<bool> {
            let mut records = self.records.borrow_mut();
            match records
                .iter_mut()
                .find(|record| record.id == record_id && record.open)
            {
                Some(record) => {
                    record.open = false;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn restore_copy(&self, book_id: BookId) -> RepoResult<()> {
            if self.store.fail_restore {
                return Err(RepoError::InvalidData("injected restore failure".to_string()));
            }
            let mut available = self.available.borrow_mut();
            match available.iter_mut().find(|(id, _)| *id == book_id) {
                Some((_, count)) => {
                    *count += 1;
                    Ok(())
                }
                None => Err(RepoError::NotFound {
                    entity: EntityKind::Book,
                    id: book_id,
                }),
            }
        }

        fn commit(self) -> RepoResult<()> {
            *self.store.available.borrow_mut() = self.available.into_inner();
            *self.store.records.borrow_mut() = self.records.into_inner();
            Ok(())
        }
    }

    impl CirculationRepository for &FakeStore {
        type Tx<'a>
            = FakeTx<'a>
        where
            Self: 'a;

        fn begin(&self, _label: &'static str) -> RepoResult<FakeTx<'_>> {
            Ok(FakeTx {
                store: *self,
                available: RefCell::new(self.available.borrow().clone()),
                records: RefCell::new(self.records.borrow().clone()),
            })
        }

        fn get_record(&self, _record_id: BorrowRecordId) -> RepoResult<Option<BorrowRecord>> {
            Ok(None)
        }

        fn list_active_for_borrower(
            &self,
            _borrower_id: BorrowerId,
        ) -> RepoResult<Vec<ActiveBorrow>> {
            Ok(Vec::new())
        }

        fn list_records_for_book(&self, _book_id: BookId) -> RepoResult<Vec<BorrowRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_insert_leaves_counter_untouched() {
        let store = FakeStore {
            available: RefCell::new(vec![(1, 2)]),
            fail_insert: true,
            ..FakeStore::default()
        };
        let service = CirculationService::new(&store);

        let err = service.borrow_book(BorrowRequest::new(1, 1)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(*store.available.borrow(), vec![(1, 2)]);
        assert!(store.records.borrow().is_empty());
    }

    #[test]
    fn last_copy_can_be_borrowed_once() {
        let store = FakeStore {
            available: RefCell::new(vec![(1, 1)]),
            ..FakeStore::default()
        };
        let service = CirculationService::new(&store);

        assert_eq!(service.borrow_book(BorrowRequest::new(1, 1)).unwrap(), 1);
        let err = service.borrow_book(BorrowRequest::new(1, 1)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(*store.available.borrow(), vec![(1, 0)]);
        assert_eq!(
            *store.records.borrow(),
            vec![FakeRecord {
                id: 1,
                book_id: 1,
                open: true
            }]
        );
    }

    #[test]
    fn return_closes_the_record_and_restores_the_copy() {
        let store = FakeStore {
            available: RefCell::new(vec![(1, 1)]),
            ..FakeStore::default()
        };
        let service = CirculationService::new(&store);
        let record_id = service.borrow_book(BorrowRequest::new(1, 1)).unwrap();

        service.return_book(record_id).unwrap();

        assert_eq!(*store.available.borrow(), vec![(1, 1)]);
        assert!(!store.records.borrow()[0].open);
        let err = service.return_book(record_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn failed_restore_leaves_record_open_and_counter_untouched() {
        let open = FakeRecord {
            id: 7,
            book_id: 1,
            open: true,
        };
        let store = FakeStore {
            available: RefCell::new(vec![(1, 0)]),
            records: RefCell::new(vec![open]),
            fail_restore: true,
            ..FakeStore::default()
        };
        let service = CirculationService::new(&store);

        let err = service.return_book(7).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(*store.records.borrow(), vec![open]);
        assert_eq!(*store.available.borrow(), vec![(1, 0)]);
    }

    #[test]
    fn invalid_ids_are_rejected_before_opening_a_unit_of_work() {
        let store = FakeStore::default();
        let service = CirculationService::new(&store);

        let err = service.borrow_book(BorrowRequest::new(0, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
