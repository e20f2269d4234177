//! # Remote Store Boundary
//!
//! This module defines the seam between the client core and the remote
//! service. The split mirrors the two halves of the wire protocol:
//!
//! - [`Gateway`] is the account-level surface: resolve the user record,
//!   perform the secondary business authentication, and open
//!   [`NoteStore`] handles for arbitrary backend endpoints.
//! - [`NoteStore`] is one backend endpoint: a user's own store, a store
//!   hosting a notebook that was shared to the user, or an
//!   organization's store. All content procedures live here.
//!
//! The core never constructs a transport itself; it asks the gateway for
//! store handles by URL and issues blocking calls against them. Handles
//! are reference-counted because domain objects ([`crate::Note`],
//! [`crate::Notebook`]) keep the store they were fetched through, so a
//! later delete or share can go straight to the owning endpoint.
//!
//! Every procedure fails with the raw [`ServiceError`] vocabulary. The
//! core translates those into [`crate::Error`] exactly once per call; see
//! `error.rs`.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryGateway`]: an in-process fake service for tests
//!   and offline use.
//!
//! A production transport lives outside this crate and implements these
//! traits over its own RPC machinery.

use std::rc::Rc;

use thiserror::Error;

pub mod memory;
pub mod records;

use records::{
    AuthenticationResult, LinkedNotebookRecord, NoteFetchSpec, NoteRecord, NotebookRecord,
    SharedNotebookRecord, User,
};

/// Raw failure vocabulary of the remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The addressed entity does not exist. `identifier` names the field
    /// the lookup was keyed on (for example `"Note.guid"`), `key` is the
    /// value that missed.
    #[error("{identifier} not found: {key}")]
    NotFound { identifier: String, key: String },

    #[error("permission denied on {0}")]
    PermissionDenied(String),

    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// The service rejected the request itself (malformed data, exceeded
    /// quota, capability not enabled for this account).
    #[error("request rejected: {0}")]
    User(String),

    #[error("service failure: {0}")]
    System(String),

    /// The call never reached the service or the response never arrived.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn not_found(identifier: &str, key: &str) -> Self {
        Self::NotFound {
            identifier: identifier.to_string(),
            key: key.to_string(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Account-level surface of the remote service.
pub trait Gateway {
    fn get_user(&self, token: &str) -> ServiceResult<User>;

    /// Secondary authentication step into the organization's domain.
    fn authenticate_to_business(&self, token: &str) -> ServiceResult<AuthenticationResult>;

    /// URL of the note store backing the given token's own account.
    fn note_store_url(&self, token: &str) -> ServiceResult<String>;

    /// Open a handle on the note store at `url`.
    fn note_store(&self, url: &str) -> ServiceResult<Rc<dyn NoteStore>>;

    /// Host used to compose public share URLs.
    fn service_host(&self) -> &str;
}

/// One backend endpoint holding notebooks and notes.
pub trait NoteStore {
    fn list_notebooks(&self, token: &str) -> ServiceResult<Vec<NotebookRecord>>;

    fn list_shared_notebooks(&self, token: &str) -> ServiceResult<Vec<SharedNotebookRecord>>;

    fn list_linked_notebooks(&self, token: &str) -> ServiceResult<Vec<LinkedNotebookRecord>>;

    fn get_notebook(&self, token: &str, guid: &str) -> ServiceResult<NotebookRecord>;

    fn get_default_notebook(&self, token: &str) -> ServiceResult<NotebookRecord>;

    /// Exchange a share key for a short-lived credential scoped to the
    /// shared notebook hosted on this store.
    fn authenticate_to_shared_notebook(
        &self,
        share_key: &str,
        token: &str,
    ) -> ServiceResult<AuthenticationResult>;

    /// Canonical shared-notebook record for the notebook a scoped
    /// credential was minted for.
    fn get_shared_notebook_by_auth(&self, token: &str) -> ServiceResult<SharedNotebookRecord>;

    fn get_note(&self, token: &str, guid: &str, spec: &NoteFetchSpec) -> ServiceResult<NoteRecord>;

    fn create_note(&self, token: &str, note: &NoteRecord) -> ServiceResult<NoteRecord>;

    fn update_note(&self, token: &str, note: &NoteRecord) -> ServiceResult<NoteRecord>;

    fn delete_note(&self, token: &str, guid: &str) -> ServiceResult<()>;

    /// Returns the share key for the note's public share.
    fn share_note(&self, token: &str, guid: &str) -> ServiceResult<String>;
}
