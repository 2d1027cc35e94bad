//! Core domain logic for the library service.
//! This crate is the single source of truth for catalog, registry and
//! circulation invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LibraryConfig, LogConfig};
pub use logging::{
    default_log_level, flush_logging, init_logging, logging_status, LoggingError,
};
pub use model::book::{Book, BookId, BookUpdate, NewBook};
pub use model::borrow_record::{
    ActiveBorrow, BorrowRecord, BorrowRecordId, BorrowRequest, RecordState,
};
pub use model::borrower::{Borrower, BorrowerId, BorrowerInput};
pub use model::{EntityKind, ValidationError};
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::borrower_repo::{BorrowerRepository, SqliteBorrowerRepository};
pub use repo::circulation_repo::{
    CirculationRepository, CirculationTx, SqliteCirculationRepository, SqliteCirculationTx,
};
pub use repo::{RepoError, RepoResult};
pub use service::catalog_service::CatalogService;
pub use service::circulation_service::CirculationService;
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::registry_service::RegistryService;

/// Minimal health-check API for host probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
