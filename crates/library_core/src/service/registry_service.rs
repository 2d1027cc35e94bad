//! Registry use-case service for borrowers.
//!
//! Mirrors the catalog service: normalize, persist, read back.

use crate::model::borrower::{Borrower, BorrowerId, BorrowerInput};
use crate::model::EntityKind;
use crate::repo::borrower_repo::BorrowerRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::report;
use log::info;

const MODULE: &str = "registry";

/// Use-case service over a borrower repository.
pub struct RegistryService<R: BorrowerRepository> {
    repo: R,
}

impl<R: BorrowerRepository> RegistryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a borrower.
    ///
    /// # Errors
    /// - `Validation` when name is blank.
    /// - `Conflict` when the email belongs to another borrower.
    pub fn add_borrower(&self, borrower: BorrowerInput) -> ServiceResult<Borrower> {
        let borrower = borrower
            .normalize()
            .map_err(|err| report("borrower_add", MODULE, err.into()))?;
        let id = self
            .repo
            .create_borrower(&borrower)
            .map_err(|err| report("borrower_add", MODULE, err.into()))?;

        info!("event=borrower_add module={MODULE} status=ok borrower_id={id}");
        self.get_borrower(id)
    }

    pub fn get_borrower(&self, id: BorrowerId) -> ServiceResult<Borrower> {
        self.repo
            .get_borrower(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Borrower, id))
    }

    /// Replaces name and contact fields of an existing borrower.
    pub fn update_borrower(
        &self,
        id: BorrowerId,
        borrower: BorrowerInput,
    ) -> ServiceResult<Borrower> {
        let borrower = borrower
            .normalize()
            .map_err(|err| report("borrower_update", MODULE, err.into()))?;
        self.repo
            .update_borrower(id, &borrower)
            .map_err(|err| report("borrower_update", MODULE, err.into()))?;

        info!("event=borrower_update module={MODULE} status=ok borrower_id={id}");
        self.get_borrower(id)
    }

    /// Deletes a borrower together with their borrow records.
    pub fn delete_borrower(&self, id: BorrowerId) -> ServiceResult<()> {
        self.repo
            .delete_borrower(id)
            .map_err(|err| report("borrower_delete", MODULE, err.into()))?;
        info!("event=borrower_delete module={MODULE} status=ok borrower_id={id}");
        Ok(())
    }

    /// Lists all borrowers ordered by name.
    pub fn list_borrowers(&self) -> ServiceResult<Vec<Borrower>> {
        Ok(self.repo.list_borrowers()?)
    }
}
