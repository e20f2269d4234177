//! Domain error taxonomy.
//!
//! Every remote failure is translated from the raw [`ServiceError`]
//! vocabulary exactly once, at the call site, via [`From`]. Components
//! then match on the translated kind to decide what is recovered locally
//! (a not-found during a scope walk, a permission failure on one linked
//! notebook) and what is surfaced to the caller.

use thiserror::Error;

use crate::store::ServiceError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("notebook not found")]
    NotebookNotFound,

    #[error("note not found")]
    NoteNotFound,

    #[error("permission denied on {0}")]
    PermissionDenied(String),

    #[error("rate limited, retry in {0}s")]
    RateLimited(u32),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("remote system error: {0}")]
    RemoteSystem(String),

    #[error("{0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<ServiceError> for Error {
    fn from(raw: ServiceError) -> Self {
        match raw {
            ServiceError::NotFound { identifier, key } => {
                // "Notebook.guid" must be tested before the "Note" prefix.
                if identifier.starts_with("Notebook")
                    || identifier.starts_with("SharedNotebook")
                    || identifier.starts_with("LinkedNotebook")
                {
                    Error::NotebookNotFound
                } else if identifier.starts_with("Note") {
                    Error::NoteNotFound
                } else {
                    Error::Unknown(format!("{} not found: {}", identifier, key))
                }
            }
            ServiceError::PermissionDenied(resource) => Error::PermissionDenied(resource),
            ServiceError::RateLimited { retry_after_secs } => Error::RateLimited(retry_after_secs),
            ServiceError::User(message) => Error::InvalidInput(message),
            ServiceError::System(message) => Error::RemoteSystem(message),
            ServiceError::Transport(message) => Error::Unknown(message),
        }
    }
}
