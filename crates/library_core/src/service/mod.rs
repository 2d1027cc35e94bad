//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into library use-cases.
//! - Normalize caller input and map persistence failures onto the
//!   transport-agnostic [`ServiceError`] taxonomy.
//! - Emit one metadata-only log event per use-case outcome.

pub mod catalog_service;
pub mod circulation_service;
pub mod error;
pub mod registry_service;

use error::{ErrorKind, ServiceError};
use log::{error, warn};

/// Logs a failed use-case and hands the error back for propagation.
pub(crate) fn report(event: &str, module: &str, err: ServiceError) -> ServiceError {
    match err.kind() {
        ErrorKind::Internal => error!(
            "event={event} module={module} status=error error_code={} error={err}",
            err.kind()
        ),
        kind => warn!("event={event} module={module} status=rejected error_code={kind}"),
    }
    err
}
