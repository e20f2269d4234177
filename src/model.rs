//! # Domain Model: Notebooks and Notes
//!
//! A [`Notebook`] is the merged view of everything the service knows
//! about one notebook across authorization domains. The same notebook can
//! surface as a personal record, a linked-notebook descriptor, a shared
//! relationship, and a business listing at the same time; aggregation
//! resolves those to a single `Notebook` keyed by guid, keeping the raw
//! contributing records as back-references.
//!
//! Construction is immutable with respect to sharing: the set of facts
//! that make a notebook "shared" is computed before the object is built
//! and passed into the constructor. The only post-construction mutation
//! is [`Notebook::merge_from`], which folds a second resolution of the
//! same guid into an existing entry during aggregation.
//!
//! A [`Note`] remembers the store handle and token it was fetched or
//! created through. Later operations on the note (update, delete, share)
//! go straight to that owning endpoint instead of re-running scope
//! resolution.

use std::fmt;
use std::rc::Rc;

use crate::store::records::{
    LinkedNotebookRecord, NoteAttributes, NoteRecord, NotebookRecord, ResourceRecord,
    SharedNotebookRecord,
};
use crate::store::NoteStore;

/// Merged view of one notebook across authorization domains.
#[derive(Clone, Default)]
pub struct Notebook {
    /// Absent only for a not-yet-persisted placeholder.
    pub guid: Option<String>,
    pub name: String,
    pub is_shared: bool,
    /// Scoped credential, present when the notebook was reached through a
    /// non-personal domain.
    pub auth_token: Option<String>,
    pub(crate) note_store: Option<Rc<dyn NoteStore>>,
    pub notebook: Option<NotebookRecord>,
    pub linked_notebook: Option<LinkedNotebookRecord>,
    pub shared_notebook: Option<SharedNotebookRecord>,
    pub business_notebook: Option<NotebookRecord>,
}

impl Notebook {
    /// A notebook listed by the user's own store.
    pub fn from_personal(record: NotebookRecord, is_shared: bool) -> Self {
        Self {
            guid: Some(record.guid.clone()),
            name: record.name.clone(),
            is_shared,
            notebook: Some(record),
            ..Self::default()
        }
    }

    /// A linked notebook fully resolved through the credential protocol.
    /// The guid is the target notebook's real guid, taken from the
    /// canonical shared record.
    pub(crate) fn from_linked(
        linked: LinkedNotebookRecord,
        shared: SharedNotebookRecord,
        auth_token: String,
        store: Rc<dyn NoteStore>,
    ) -> Self {
        Self {
            guid: Some(shared.notebook_guid.clone()),
            name: linked.share_name.clone(),
            auth_token: Some(auth_token),
            note_store: Some(store),
            linked_notebook: Some(linked),
            shared_notebook: Some(shared),
            ..Self::default()
        }
    }

    /// A linked notebook reconciled against the organization's catalog.
    pub(crate) fn from_business(
        business: NotebookRecord,
        linked: LinkedNotebookRecord,
        shared: SharedNotebookRecord,
        is_shared: bool,
    ) -> Self {
        Self {
            guid: Some(business.guid.clone()),
            name: business.name.clone(),
            is_shared,
            notebook: Some(business.clone()),
            business_notebook: Some(business),
            linked_notebook: Some(linked),
            shared_notebook: Some(shared),
            ..Self::default()
        }
    }

    pub fn is_linked(&self) -> bool {
        self.linked_notebook.is_some()
    }

    pub fn is_business(&self) -> bool {
        self.business_notebook.is_some()
    }

    pub fn is_default(&self) -> bool {
        self.notebook
            .as_ref()
            .is_some_and(|record| record.default_notebook)
    }

    /// Folds a second resolution of the same guid into this entry.
    /// Sharing is sticky; descriptors and credentials fill gaps only, so
    /// the first resolution of each domain wins.
    pub(crate) fn merge_from(&mut self, other: Notebook) {
        self.is_shared |= other.is_shared;
        if self.auth_token.is_none() {
            self.auth_token = other.auth_token;
        }
        if self.note_store.is_none() {
            self.note_store = other.note_store;
        }
        if self.notebook.is_none() {
            self.notebook = other.notebook;
        }
        if self.linked_notebook.is_none() {
            self.linked_notebook = other.linked_notebook;
        }
        if self.shared_notebook.is_none() {
            self.shared_notebook = other.shared_notebook;
        }
        if self.business_notebook.is_none() {
            self.business_notebook = other.business_notebook;
        }
    }
}

impl fmt::Debug for Notebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notebook")
            .field("guid", &self.guid)
            .field("name", &self.name)
            .field("is_shared", &self.is_shared)
            .field("linked", &self.is_linked())
            .field("business", &self.is_business())
            .finish()
    }
}

/// A note plus the credential it was fetched or created through.
#[derive(Clone, Default)]
pub struct Note {
    /// Absent until the note has been persisted once.
    pub guid: Option<String>,
    pub title: String,
    pub content: String,
    pub attributes: NoteAttributes,
    pub resources: Vec<ResourceRecord>,
    saved: bool,
    pub auth_token: Option<String>,
    pub(crate) note_store: Option<Rc<dyn NoteStore>>,
}

impl Note {
    /// A fresh, never-persisted note.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Whether this note has been persisted at least once. Uploading a
    /// saved note performs an update, never a second create.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Wraps a record returned by the service, stamped with the store and
    /// token it came through. A record carrying a guid has by definition
    /// been persisted.
    pub(crate) fn from_record(record: NoteRecord, store: Rc<dyn NoteStore>, token: String) -> Self {
        Self {
            saved: record.guid.is_some(),
            guid: record.guid,
            title: record.title,
            content: record.content.unwrap_or_default(),
            attributes: record.attributes,
            resources: record.resources,
            auth_token: Some(token),
            note_store: Some(store),
        }
    }

    pub(crate) fn to_record(&self) -> NoteRecord {
        NoteRecord {
            guid: self.guid.clone(),
            title: self.title.clone(),
            content: Some(self.content.clone()),
            attributes: self.attributes.clone(),
            resources: self.resources.clone(),
            ..Default::default()
        }
    }

    /// True when the note remembers the endpoint and credential that owns
    /// it, so mutating operations can skip scope resolution.
    pub fn has_owning_credentials(&self) -> bool {
        self.auth_token.is_some() && self.note_store.is_some()
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("guid", &self.guid)
            .field("title", &self.title)
            .field("saved", &self.saved)
            .field("resources", &self.resources.len())
            .finish()
    }
}
