//! # Session Facade
//!
//! [`Client`] is the single entry point for all operations. It owns the
//! base token and the session state that is expensive to establish: the
//! user record, the handle on the user's own store, and the secondary
//! business authentication. Each of those is computed at most once per
//! client and kept for its lifetime; credential rotation requires a new
//! client.
//!
//! The facade is generic over [`Gateway`], so the same code runs against
//! a production transport or the in-memory service in tests.
//!
//! A client instance is single-threaded by design: all remote calls are
//! blocking and issued sequentially, and the lazy session caches are not
//! synchronized. Callers wanting parallelism use one client per thread.
//!
//! The aggregation and scope-fallback operations live in `catalog.rs`
//! and `scope.rs`; this file holds construction, the session caches, the
//! raw listing accessors, and note upload.

use std::rc::Rc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::auth;
use crate::error::{Error, Result};
use crate::model::{Note, Notebook};
use crate::scope::Scope;
use crate::store::records::{
    AuthenticationResult, LinkedNotebookRecord, NoteRecord, NotebookRecord, SharedNotebookRecord,
    User,
};
use crate::store::{Gateway, NoteStore};

pub struct Client<G: Gateway> {
    gateway: G,
    token: String,
    user: OnceCell<User>,
    personal_store: OnceCell<Rc<dyn NoteStore>>,
    business_auth: OnceCell<AuthenticationResult>,
    business_store: OnceCell<Rc<dyn NoteStore>>,
}

impl<G: Gateway> Client<G> {
    pub fn new(token: impl Into<String>, gateway: G) -> Self {
        Self {
            gateway,
            token: token.into(),
            user: OnceCell::new(),
            personal_store: OnceCell::new(),
            business_auth: OnceCell::new(),
            business_store: OnceCell::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The authenticated user's account record, fetched once per client.
    pub fn user(&self) -> Result<&User> {
        self.user.get_or_try_init(|| {
            debug!("fetching user record");
            self.gateway.get_user(&self.token).map_err(Error::from)
        })
    }

    /// Whether the account belongs to an organization. Derived from the
    /// user record; does not touch the business domain.
    pub fn is_business_user(&self) -> Result<bool> {
        Ok(self.user()?.business_id.is_some())
    }

    /// The secondary business authentication, performed once per client.
    pub fn business_auth(&self) -> Result<&AuthenticationResult> {
        self.business_auth.get_or_try_init(|| {
            debug!("authenticating to business");
            self.gateway
                .authenticate_to_business(&self.token)
                .map_err(Error::from)
        })
    }

    pub fn business_token(&self) -> Result<&str> {
        Ok(self.business_auth()?.authentication_token.as_str())
    }

    /// Handle on the user's own store, opened once per client.
    pub fn personal_note_store(&self) -> Result<Rc<dyn NoteStore>> {
        self.personal_store
            .get_or_try_init(|| {
                let url = self.gateway.note_store_url(&self.token).map_err(Error::from)?;
                self.gateway.note_store(&url).map_err(Error::from)
            })
            .map(Rc::clone)
    }

    /// Handle on the organization's store. Refused without a remote call
    /// when the account is not business-enabled.
    pub fn business_note_store(&self) -> Result<Rc<dyn NoteStore>> {
        if !self.is_business_user()? {
            return Err(Error::PermissionDenied("business".to_string()));
        }
        self.business_store
            .get_or_try_init(|| {
                let url = self.business_auth()?.note_store_url.clone();
                self.gateway.note_store(&url).map_err(Error::from)
            })
            .map(Rc::clone)
    }

    // --- Raw listings ---

    pub fn list_personal_notebooks(&self) -> Result<Vec<NotebookRecord>> {
        let store = self.personal_note_store()?;
        store.list_notebooks(&self.token).map_err(Error::from)
    }

    /// Sharing relationships granted on the user's own notebooks.
    pub fn list_shared_notebook_records(&self) -> Result<Vec<SharedNotebookRecord>> {
        let store = self.personal_note_store()?;
        store.list_shared_notebooks(&self.token).map_err(Error::from)
    }

    /// Raw linked-notebook descriptors, in service listing order.
    pub fn list_linked_notebook_records(&self) -> Result<Vec<LinkedNotebookRecord>> {
        let store = self.personal_note_store()?;
        store.list_linked_notebooks(&self.token).map_err(Error::from)
    }

    pub fn business_shared_notebook_records(&self) -> Result<Vec<SharedNotebookRecord>> {
        let store = self.business_note_store()?;
        store
            .list_shared_notebooks(self.business_token()?)
            .map_err(Error::from)
    }

    pub fn business_notebook_records(&self) -> Result<Vec<NotebookRecord>> {
        let store = self.business_note_store()?;
        store
            .list_notebooks(self.business_token()?)
            .map_err(Error::from)
    }

    pub fn get_default_notebook(&self) -> Result<Notebook> {
        let store = self.personal_note_store()?;
        let record = store
            .get_default_notebook(&self.token)
            .map_err(Error::from)?;
        Ok(Notebook::from_personal(record, false))
    }

    // --- Note upload ---

    /// Persists a note. A note that was saved before is updated in place;
    /// a fresh note is created, in `notebook` when given, otherwise in
    /// the default notebook. An app-scoped token always writes to its
    /// implicit notebook, ignoring any explicit target.
    ///
    /// When the target notebook is unknown to the personal store, the
    /// notebook is resolved under linked scope and creation is retried
    /// against the owning endpoint with the scoped credential.
    pub fn upload_note(&self, note: &Note, notebook: Option<&Notebook>) -> Result<Note> {
        // The implicit app notebook is addressed by omitting the guid.
        let target = if auth::is_app_notebook_token(&self.token) {
            None
        } else {
            notebook
        };

        if note.is_saved() {
            return self.replace_note(note);
        }

        let mut record = note.to_record();
        if let Some(guid) = target.and_then(|nb| nb.guid.as_deref()) {
            record.notebook_guid = Some(guid.to_string());
        }

        let store = self.personal_note_store()?;
        match store.create_note(&self.token, &record) {
            Ok(created) => Ok(self.adopt_uploaded(created, store, self.token.clone(), &note.content)),
            Err(raw) => match Error::from(raw) {
                Error::NotebookNotFound => self.create_in_linked(record, target, &note.content),
                err => Err(err),
            },
        }
    }

    /// Content-replacing update of an already-saved note, issued against
    /// its owning endpoint (personal store when no credential is carried).
    pub fn replace_note(&self, note: &Note) -> Result<Note> {
        if note.guid.is_none() {
            return Err(Error::InvalidInput(
                "note was never assigned a guid".to_string(),
            ));
        }
        let (store, token) = match (note.note_store.clone(), note.auth_token.clone()) {
            (Some(store), Some(token)) => (store, token),
            _ => (self.personal_note_store()?, self.token.clone()),
        };
        let record = note.to_record();
        let updated = store.update_note(&token, &record).map_err(Error::from)?;
        Ok(self.adopt_uploaded(updated, store, token, &note.content))
    }

    fn create_in_linked(
        &self,
        record: NoteRecord,
        target: Option<&Notebook>,
        content: &str,
    ) -> Result<Note> {
        let Some(guid) = target.and_then(|nb| nb.guid.as_deref()) else {
            return Err(Error::NotebookNotFound);
        };
        debug!(notebook = guid, "target unknown to personal store, searching linked scope");
        let Some(found) = self.get_notebook(guid, Some(Scope::Linked))? else {
            return Err(Error::NotebookNotFound);
        };
        let (Some(linked), Some(token)) = (found.linked_notebook.as_ref(), found.auth_token.clone())
        else {
            // Resolved to something we hold no linked credential for.
            return Err(Error::NotebookNotFound);
        };
        let store = match found.note_store.clone() {
            Some(store) => store,
            None => self
                .gateway
                .note_store(&linked.note_store_url)
                .map_err(Error::from)?,
        };
        let created = store.create_note(&token, &record).map_err(Error::from)?;
        Ok(self.adopt_uploaded(created, store, token, content))
    }

    /// Wraps a record returned by create/update. The locally-held content
    /// is restored because the service does not echo rich content back
    /// verbatim.
    fn adopt_uploaded(
        &self,
        mut record: NoteRecord,
        store: Rc<dyn NoteStore>,
        token: String,
        content: &str,
    ) -> Note {
        record.content = Some(content.to_string());
        Note::from_record(record, store, token)
    }

    /// Composes the public share URL for a note from the owning token's
    /// shard identifier and a share key.
    pub(crate) fn share_url_for(&self, guid: &str, token: &str, share_key: &str) -> Result<String> {
        let Some(shard) = auth::shard_id_from_token(token) else {
            return Err(Error::InvalidInput(
                "auth token carries no shard id".to_string(),
            ));
        };
        Ok(format!(
            "{}/shard/{}/sh/{}/{}",
            self.gateway.service_host(),
            shard,
            guid,
            share_key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{ServiceFixture, BASE_TOKEN};

    #[test]
    fn user_record_is_fetched_once() {
        let fixture = ServiceFixture::new();
        let client = fixture.client();

        assert_eq!(client.user().unwrap().username, "alice");
        assert!(!client.is_business_user().unwrap());
        assert_eq!(client.user().unwrap().id, 42);

        let fetches = fixture
            .gateway
            .calls()
            .iter()
            .filter(|call| call.as_str() == "gateway:get_user")
            .count();
        assert_eq!(fetches, 1);
    }

    #[test]
    fn business_store_is_refused_locally_for_personal_accounts() {
        let fixture = ServiceFixture::new();
        let client = fixture.client();
        client.user().unwrap();
        let calls_before = fixture.gateway.calls().len();

        let result = client.business_note_store();
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
        // No authentication or store-opening call went out.
        assert_eq!(fixture.gateway.calls().len(), calls_before);
    }

    #[test]
    fn business_accessors_reuse_one_authentication() {
        let fixture = ServiceFixture::new().with_business();
        let client = fixture.client();

        client.business_note_store().unwrap();
        client.business_token().unwrap();
        client.business_shared_notebook_records().unwrap();

        let auths = fixture
            .gateway
            .calls()
            .iter()
            .filter(|call| call.as_str() == "gateway:authenticate_to_business")
            .count();
        assert_eq!(auths, 1);
    }

    #[test]
    fn share_url_is_composed_from_shard_guid_and_key() {
        let fixture = ServiceFixture::new();
        let client = fixture.client();
        let url = client
            .share_url_for("note-1", BASE_TOKEN, "sh-key")
            .unwrap();
        assert_eq!(
            url,
            "https://notes.example.com/shard/s1/sh/note-1/sh-key"
        );
    }

    #[test]
    fn share_url_requires_a_shard_segment() {
        let fixture = ServiceFixture::new();
        let client = fixture.client();
        let result = client.share_url_for("note-1", "U=42:E=deadbeef", "sh-key");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
