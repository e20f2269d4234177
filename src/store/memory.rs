//! In-memory implementation of the remote store boundary, for tests and
//! offline use.
//!
//! Uses `RefCell` for interior mutability since a client session is
//! single-threaded. Every call is appended to a shared journal
//! (`"<label>:<method>"`) so tests can assert on call order and on calls
//! that must not happen; any method can be forced to fail with a chosen
//! [`ServiceError`] to exercise the failure paths.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;
use uuid::Uuid;

use super::records::{
    AuthenticationResult, LinkedNotebookRecord, NoteFetchSpec, NoteRecord, NotebookRecord,
    SharedNotebookRecord, User,
};
use super::{Gateway, NoteStore, ServiceError, ServiceResult};

type Journal = Rc<RefCell<Vec<String>>>;

/// One simulated backend endpoint.
pub struct InMemoryNoteStore {
    url: String,
    label: String,
    journal: Journal,
    notebooks: RefCell<Vec<NotebookRecord>>,
    shared_notebooks: RefCell<Vec<SharedNotebookRecord>>,
    linked_notebooks: RefCell<Vec<LinkedNotebookRecord>>,
    notes: RefCell<HashMap<String, NoteRecord>>,
    share_auth: RefCell<HashMap<String, AuthenticationResult>>,
    shared_by_token: RefCell<HashMap<String, SharedNotebookRecord>>,
    forced_errors: RefCell<HashMap<&'static str, ServiceError>>,
}

impl InMemoryNoteStore {
    fn new(url: &str, label: &str, journal: Journal) -> Rc<Self> {
        Rc::new(Self {
            url: url.to_string(),
            label: label.to_string(),
            journal,
            notebooks: RefCell::new(Vec::new()),
            shared_notebooks: RefCell::new(Vec::new()),
            linked_notebooks: RefCell::new(Vec::new()),
            notes: RefCell::new(HashMap::new()),
            share_auth: RefCell::new(HashMap::new()),
            shared_by_token: RefCell::new(HashMap::new()),
            forced_errors: RefCell::new(HashMap::new()),
        })
    }

    /// A store with its own journal, not reachable through any gateway.
    pub fn detached(url: &str, label: &str) -> Rc<Self> {
        Self::new(url, label, Rc::new(RefCell::new(Vec::new())))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // --- Seeding ---

    pub fn add_notebook(&self, record: NotebookRecord) {
        self.notebooks.borrow_mut().push(record);
    }

    pub fn add_shared_relationship(&self, share_key: &str, notebook_guid: &str) {
        self.shared_notebooks.borrow_mut().push(SharedNotebookRecord {
            share_key: share_key.to_string(),
            notebook_guid: notebook_guid.to_string(),
            username: None,
        });
    }

    pub fn add_linked(&self, record: LinkedNotebookRecord) {
        self.linked_notebooks.borrow_mut().push(record);
    }

    /// Stores a note, assigning a guid when the record has none. Returns
    /// the note's guid.
    pub fn put_note(&self, mut record: NoteRecord) -> String {
        let guid = record
            .guid
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        self.notes.borrow_mut().insert(guid.clone(), record);
        guid
    }

    /// Registers a share key on this store: authenticating with it mints
    /// `token`, and the canonical shared record for that token points at
    /// `notebook_guid`.
    pub fn grant_share(&self, share_key: &str, token: &str, notebook_guid: &str) {
        self.share_auth.borrow_mut().insert(
            share_key.to_string(),
            AuthenticationResult {
                authentication_token: token.to_string(),
                note_store_url: self.url.clone(),
                expiration: None,
            },
        );
        self.shared_by_token.borrow_mut().insert(
            token.to_string(),
            SharedNotebookRecord {
                share_key: share_key.to_string(),
                notebook_guid: notebook_guid.to_string(),
                username: None,
            },
        );
    }

    /// Forces `method` to fail with `error` on every call until cleared.
    pub fn force_error(&self, method: &'static str, error: ServiceError) {
        self.forced_errors.borrow_mut().insert(method, error);
    }

    pub fn clear_error(&self, method: &'static str) {
        self.forced_errors.borrow_mut().remove(method);
    }

    // --- Inspection ---

    pub fn note(&self, guid: &str) -> Option<NoteRecord> {
        self.notes.borrow().get(guid).cloned()
    }

    pub fn note_count(&self) -> usize {
        self.notes.borrow().len()
    }

    pub fn linked_notebook_records(&self) -> Vec<LinkedNotebookRecord> {
        self.linked_notebooks.borrow().clone()
    }

    fn begin(&self, method: &'static str) -> ServiceResult<()> {
        self.journal
            .borrow_mut()
            .push(format!("{}:{}", self.label, method));
        if let Some(error) = self.forced_errors.borrow().get(method) {
            return Err(error.clone());
        }
        Ok(())
    }
}

impl NoteStore for InMemoryNoteStore {
    fn list_notebooks(&self, _token: &str) -> ServiceResult<Vec<NotebookRecord>> {
        self.begin("list_notebooks")?;
        Ok(self.notebooks.borrow().clone())
    }

    fn list_shared_notebooks(&self, _token: &str) -> ServiceResult<Vec<SharedNotebookRecord>> {
        self.begin("list_shared_notebooks")?;
        Ok(self.shared_notebooks.borrow().clone())
    }

    fn list_linked_notebooks(&self, _token: &str) -> ServiceResult<Vec<LinkedNotebookRecord>> {
        self.begin("list_linked_notebooks")?;
        Ok(self.linked_notebooks.borrow().clone())
    }

    fn get_notebook(&self, _token: &str, guid: &str) -> ServiceResult<NotebookRecord> {
        self.begin("get_notebook")?;
        self.notebooks
            .borrow()
            .iter()
            .find(|record| record.guid == guid)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Notebook.guid", guid))
    }

    fn get_default_notebook(&self, _token: &str) -> ServiceResult<NotebookRecord> {
        self.begin("get_default_notebook")?;
        self.notebooks
            .borrow()
            .iter()
            .find(|record| record.default_notebook)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Notebook.default_notebook", ""))
    }

    fn authenticate_to_shared_notebook(
        &self,
        share_key: &str,
        _token: &str,
    ) -> ServiceResult<AuthenticationResult> {
        self.begin("authenticate_to_shared_notebook")?;
        self.share_auth
            .borrow()
            .get(share_key)
            .cloned()
            .ok_or_else(|| ServiceError::PermissionDenied("SharedNotebook.shareKey".to_string()))
    }

    fn get_shared_notebook_by_auth(&self, token: &str) -> ServiceResult<SharedNotebookRecord> {
        self.begin("get_shared_notebook_by_auth")?;
        self.shared_by_token
            .borrow()
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::PermissionDenied("authenticationToken".to_string()))
    }

    fn get_note(&self, _token: &str, guid: &str, spec: &NoteFetchSpec) -> ServiceResult<NoteRecord> {
        self.begin("get_note")?;
        let mut record = self
            .notes
            .borrow()
            .get(guid)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Note.guid", guid))?;
        if !spec.with_content {
            record.content = None;
        }
        if !spec.with_resources {
            record.resources.clear();
        }
        Ok(record)
    }

    fn create_note(&self, _token: &str, note: &NoteRecord) -> ServiceResult<NoteRecord> {
        self.begin("create_note")?;
        if let Some(notebook_guid) = note.notebook_guid.as_deref() {
            let known = self
                .notebooks
                .borrow()
                .iter()
                .any(|record| record.guid == notebook_guid);
            if !known {
                return Err(ServiceError::not_found("Notebook.guid", notebook_guid));
            }
        }
        let mut stored = note.clone();
        stored.guid = Some(Uuid::new_v4().to_string());
        let now = Utc::now();
        stored.created = Some(now);
        stored.updated = Some(now);
        self.notes
            .borrow_mut()
            .insert(stored.guid.clone().unwrap_or_default(), stored.clone());
        Ok(stored)
    }

    fn update_note(&self, _token: &str, note: &NoteRecord) -> ServiceResult<NoteRecord> {
        self.begin("update_note")?;
        let guid = note
            .guid
            .clone()
            .ok_or_else(|| ServiceError::not_found("Note.guid", ""))?;
        let mut notes = self.notes.borrow_mut();
        let existing = notes
            .get(&guid)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("Note.guid", &guid))?;
        let mut stored = note.clone();
        stored.created = existing.created;
        stored.updated = Some(Utc::now());
        if stored.notebook_guid.is_none() {
            stored.notebook_guid = existing.notebook_guid;
        }
        notes.insert(guid, stored.clone());
        Ok(stored)
    }

    fn delete_note(&self, _token: &str, guid: &str) -> ServiceResult<()> {
        self.begin("delete_note")?;
        self.notes
            .borrow_mut()
            .remove(guid)
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("Note.guid", guid))
    }

    fn share_note(&self, _token: &str, guid: &str) -> ServiceResult<String> {
        self.begin("share_note")?;
        if !self.notes.borrow().contains_key(guid) {
            return Err(ServiceError::not_found("Note.guid", guid));
        }
        Ok(format!("sh-{}", Uuid::new_v4().simple()))
    }
}

struct GatewayState {
    host: String,
    journal: Journal,
    users: RefCell<HashMap<String, User>>,
    personal_urls: RefCell<HashMap<String, String>>,
    business_auth: RefCell<HashMap<String, AuthenticationResult>>,
    stores: RefCell<HashMap<String, Rc<InMemoryNoteStore>>>,
}

/// Account-level half of the in-memory service. Cloning shares the
/// underlying state, so fixtures keep a handle while the client owns its
/// own copy.
#[derive(Clone)]
pub struct InMemoryGateway {
    inner: Rc<GatewayState>,
}

impl InMemoryGateway {
    pub fn new(host: &str) -> Self {
        Self {
            inner: Rc::new(GatewayState {
                host: host.to_string(),
                journal: Rc::new(RefCell::new(Vec::new())),
                users: RefCell::new(HashMap::new()),
                personal_urls: RefCell::new(HashMap::new()),
                business_auth: RefCell::new(HashMap::new()),
                stores: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Creates (or replaces) the store serving `url`.
    pub fn add_store(&self, url: &str, label: &str) -> Rc<InMemoryNoteStore> {
        let store = InMemoryNoteStore::new(url, label, self.inner.journal.clone());
        self.inner
            .stores
            .borrow_mut()
            .insert(url.to_string(), store.clone());
        store
    }

    pub fn register_user(&self, token: &str, user: User, note_store_url: &str) {
        self.inner.users.borrow_mut().insert(token.to_string(), user);
        self.inner
            .personal_urls
            .borrow_mut()
            .insert(token.to_string(), note_store_url.to_string());
    }

    pub fn register_business_auth(&self, token: &str, auth: AuthenticationResult) {
        self.inner
            .business_auth
            .borrow_mut()
            .insert(token.to_string(), auth);
    }

    pub fn store(&self, url: &str) -> Option<Rc<InMemoryNoteStore>> {
        self.inner.stores.borrow().get(url).cloned()
    }

    /// Everything called so far, as `"<label>:<method>"` entries.
    pub fn calls(&self) -> Vec<String> {
        self.inner.journal.borrow().clone()
    }

    fn begin(&self, method: &str) {
        self.inner
            .journal
            .borrow_mut()
            .push(format!("gateway:{}", method));
    }
}

impl Gateway for InMemoryGateway {
    fn get_user(&self, token: &str) -> ServiceResult<User> {
        self.begin("get_user");
        self.inner
            .users
            .borrow()
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::PermissionDenied("authenticationToken".to_string()))
    }

    fn authenticate_to_business(&self, token: &str) -> ServiceResult<AuthenticationResult> {
        self.begin("authenticate_to_business");
        self.inner
            .business_auth
            .borrow()
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::PermissionDenied("business".to_string()))
    }

    fn note_store_url(&self, token: &str) -> ServiceResult<String> {
        self.begin("note_store_url");
        self.inner
            .personal_urls
            .borrow()
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::PermissionDenied("authenticationToken".to_string()))
    }

    fn note_store(&self, url: &str) -> ServiceResult<Rc<dyn NoteStore>> {
        self.begin("note_store");
        self.inner
            .stores
            .borrow()
            .get(url)
            .map(|store| store.clone() as Rc<dyn NoteStore>)
            .ok_or_else(|| ServiceError::Transport(format!("unknown endpoint {}", url)))
    }

    fn service_host(&self) -> &str {
        &self.inner.host
    }
}

/// Builder-style fixtures for exercising a client against the in-memory
/// service.
pub mod fixtures {
    use std::rc::Rc;

    use super::{InMemoryGateway, InMemoryNoteStore};
    use crate::client::Client;
    use crate::store::records::{AuthenticationResult, LinkedNotebookRecord, NotebookRecord, User};

    /// Personal token: shard `s1`, no app-notebook restriction.
    pub const BASE_TOKEN: &str = "S=s1:U=42:E=157e:C=9a1:P=85:A=pads:H=b8c6";

    /// Token minted by the business authentication step.
    pub const BUSINESS_TOKEN: &str = "S=s9:U=42:E=157e:C=9a1:P=85:A=pads:H=77d1";

    pub const PERSONAL_URL: &str = "https://notes.example.com/shard/s1/notestore";
    pub const BUSINESS_URL: &str = "https://notes.example.com/shard/s9/notestore";

    pub struct ServiceFixture {
        pub gateway: InMemoryGateway,
        pub personal: Rc<InMemoryNoteStore>,
    }

    impl Default for ServiceFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ServiceFixture {
        /// A personal account with an empty personal store.
        pub fn new() -> Self {
            let gateway = InMemoryGateway::new("https://notes.example.com");
            let personal = gateway.add_store(PERSONAL_URL, "personal");
            gateway.register_user(
                BASE_TOKEN,
                User {
                    id: 42,
                    username: "alice".to_string(),
                    shard_id: Some("s1".to_string()),
                    business_id: None,
                },
                PERSONAL_URL,
            );
            Self { gateway, personal }
        }

        /// Upgrades the account to a business one: organization id on the
        /// user record, a business store, and a working secondary
        /// authentication.
        pub fn with_business(self) -> Self {
            self.gateway.register_user(
                BASE_TOKEN,
                User {
                    id: 42,
                    username: "alice".to_string(),
                    shard_id: Some("s1".to_string()),
                    business_id: Some(7),
                },
                PERSONAL_URL,
            );
            self.gateway.add_store(BUSINESS_URL, "business");
            self.gateway.register_business_auth(
                BASE_TOKEN,
                AuthenticationResult {
                    authentication_token: BUSINESS_TOKEN.to_string(),
                    note_store_url: BUSINESS_URL.to_string(),
                    expiration: None,
                },
            );
            self
        }

        pub fn add_store(&self, url: &str, label: &str) -> Rc<InMemoryNoteStore> {
            self.gateway.add_store(url, label)
        }

        pub fn business_store(&self) -> Rc<InMemoryNoteStore> {
            self.gateway.store(BUSINESS_URL).expect("business store")
        }

        /// Wires a fully-resolvable linked notebook: the target notebook
        /// and share grant on `remote`, and the linking descriptor in the
        /// personal store.
        pub fn link_remote_notebook(
            &self,
            remote: &Rc<InMemoryNoteStore>,
            guid: &str,
            name: &str,
            share_key: &str,
            remote_token: &str,
        ) {
            remote.add_notebook(NotebookRecord {
                guid: guid.to_string(),
                name: name.to_string(),
                ..Default::default()
            });
            remote.grant_share(share_key, remote_token, guid);
            self.personal.add_linked(LinkedNotebookRecord {
                guid: format!("link-{}", guid),
                share_name: name.to_string(),
                share_key: Some(share_key.to_string()),
                note_store_url: remote.url().to_string(),
                username: None,
                shard_id: None,
            });
        }

        /// A bare linking descriptor in the personal store, with no
        /// guarantee any store will honor its share key.
        pub fn link_descriptor(&self, name: &str, note_store_url: &str, share_key: Option<&str>) {
            self.personal.add_linked(LinkedNotebookRecord {
                guid: format!("link-{}", name),
                share_name: name.to_string(),
                share_key: share_key.map(str::to_string),
                note_store_url: note_store_url.to_string(),
                username: None,
                shard_id: None,
            });
        }

        pub fn client(&self) -> Client<InMemoryGateway> {
            Client::new(BASE_TOKEN, self.gateway.clone())
        }
    }
}
