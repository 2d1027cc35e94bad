//! Error taxonomy shared by catalog, registry and circulation use-cases.
//!
//! Kinds are transport-agnostic; mapping them to status codes is up to the
//! host.

use crate::model::book::BookId;
use crate::model::{EntityKind, ValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse error class a host can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller input is missing or malformed.
    Validation,
    /// Unique value already taken.
    Conflict,
    /// Referenced record absent (or, for returns, already closed).
    NotFound,
    /// No copy left to lend.
    Unavailable,
    /// Unexpected store failure.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Use-case failure reported synchronously to the caller.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    Conflict { field: &'static str, value: String },
    NotFound { entity: EntityKind, id: i64 },
    Unavailable(BookId),
    Internal(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: EntityKind, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict { field, value } => write!(f, "{field} `{value}` is already in use"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Unavailable(book_id) => write!(f, "book {book_id} has no available copies"),
            Self::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict { field, value } => Self::Conflict { field, value },
            other => Self::Internal(other),
        }
    }
}
