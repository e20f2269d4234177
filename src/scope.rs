//! # Scope Fallback
//!
//! Single-entity operations (note and notebook lookup, delete, share)
//! cannot know up front which authorization domain owns their target.
//! The resolution protocol is uniform: try the personal store first and,
//! only on a not-found outcome, walk the linked-notebook descriptors in
//! listing order, minting a scoped credential per descriptor. The walk
//! stops at the first success; a permission failure or a miss on one
//! descriptor just moves on to the next. Any other failure aborts the
//! whole operation.
//!
//! Not-found at the outermost requested scope is not an error: lookups
//! return `Ok(None)` so callers can tell "does not exist" from "call
//! failed".

use tracing::{debug, trace};

use crate::auth;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::model::{Note, Notebook};
use crate::store::records::NoteFetchSpec;
use crate::store::Gateway;

/// The authorization domain searched for an entity. `None` at a call
/// site means "personal first, then linked".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Personal,
    Linked,
}

impl<G: Gateway> Client<G> {
    /// Looks a note up by guid, with content and resources. Returns
    /// `Ok(None)` when the note exists nowhere in the requested scope.
    pub fn get_note(&self, guid: &str, scope: Option<Scope>) -> Result<Option<Note>> {
        if scope != Some(Scope::Linked) {
            let store = self.personal_note_store()?;
            match store.get_note(self.token(), guid, &NoteFetchSpec::content_and_resources()) {
                Ok(record) => {
                    return Ok(Some(Note::from_record(
                        record,
                        store,
                        self.token().to_string(),
                    )));
                }
                Err(raw) => match Error::from(raw) {
                    Error::NoteNotFound => {
                        if scope == Some(Scope::Personal) {
                            return Ok(None);
                        }
                    }
                    err => return Err(err),
                },
            }
        }

        debug!(guid, "note not in personal scope, walking linked notebooks");
        for linked in self.list_linked_notebook_records()? {
            let (store, auth) =
                match auth::resolve_shared_access(self.gateway(), self.token(), &linked) {
                    Ok(resolved) => resolved,
                    Err(Error::PermissionDenied(_)) => {
                        trace!(notebook = %linked.share_name, "no access, skipping");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
            match store.get_note(
                &auth.authentication_token,
                guid,
                &NoteFetchSpec::content_and_resources(),
            ) {
                Ok(record) => {
                    return Ok(Some(Note::from_record(
                        record,
                        store,
                        auth.authentication_token,
                    )));
                }
                Err(raw) => match Error::from(raw) {
                    Error::NoteNotFound | Error::PermissionDenied(_) => continue,
                    err => return Err(err),
                },
            }
        }
        Ok(None)
    }

    /// Looks a notebook up by guid. Linked scope resolves each descriptor
    /// in full and matches on the target notebook's real guid.
    pub fn get_notebook(&self, guid: &str, scope: Option<Scope>) -> Result<Option<Notebook>> {
        if scope != Some(Scope::Linked) {
            let store = self.personal_note_store()?;
            match store.get_notebook(self.token(), guid) {
                Ok(record) => return Ok(Some(Notebook::from_personal(record, false))),
                Err(raw) => match Error::from(raw) {
                    Error::NotebookNotFound => {
                        if scope == Some(Scope::Personal) {
                            return Ok(None);
                        }
                    }
                    err => return Err(err),
                },
            }
        }

        debug!(guid, "notebook not in personal scope, walking linked notebooks");
        for linked in self.list_linked_notebook_records()? {
            let notebook = match auth::notebook_by_linked(self.gateway(), self.token(), &linked) {
                Ok(notebook) => notebook,
                Err(Error::PermissionDenied(_)) | Err(Error::NotebookNotFound) => {
                    trace!(notebook = %linked.share_name, "unresolvable, skipping");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if notebook.guid.as_deref() == Some(guid) {
                return Ok(Some(notebook));
            }
        }
        Ok(None)
    }

    /// Deletes a note. A note carrying its owning credential is deleted
    /// directly; otherwise the owning domain is located first. Returns
    /// `Ok(false)` when the note exists nowhere.
    pub fn delete_note(&self, note: &Note) -> Result<bool> {
        let Some(guid) = note.guid.as_deref() else {
            return Err(Error::InvalidInput(
                "note was never saved remotely".to_string(),
            ));
        };

        if let (Some(store), Some(token)) = (note.note_store.clone(), note.auth_token.as_deref()) {
            return match store.delete_note(token, guid) {
                Ok(()) => Ok(true),
                Err(raw) => match Error::from(raw) {
                    // The carried credential went stale; locate the note again.
                    Error::NoteNotFound => match self.get_note(guid, None)? {
                        Some(found) => self.delete_note(&found),
                        None => Ok(false),
                    },
                    err => Err(err),
                },
            };
        }

        let store = self.personal_note_store()?;
        match store.delete_note(self.token(), guid) {
            Ok(()) => Ok(true),
            Err(raw) => match Error::from(raw) {
                Error::NoteNotFound => match self.get_note(guid, Some(Scope::Linked))? {
                    Some(found) => self.delete_note(&found),
                    None => Ok(false),
                },
                err => Err(err),
            },
        }
    }

    /// Shares a note publicly, returning the composed share URL. Returns
    /// `Ok(None)` when the note exists nowhere.
    pub fn share_note(&self, note: &Note) -> Result<Option<String>> {
        let Some(guid) = note.guid.as_deref() else {
            return Err(Error::InvalidInput(
                "note was never saved remotely".to_string(),
            ));
        };

        if let (Some(store), Some(token)) = (note.note_store.clone(), note.auth_token.as_deref()) {
            return match store.share_note(token, guid) {
                Ok(share_key) => self.share_url_for(guid, token, &share_key).map(Some),
                Err(raw) => match Error::from(raw) {
                    Error::NoteNotFound => match self.get_note(guid, None)? {
                        Some(found) => self.share_note(&found),
                        None => Ok(None),
                    },
                    err => Err(err),
                },
            };
        }

        let store = self.personal_note_store()?;
        match store.share_note(self.token(), guid) {
            Ok(share_key) => self
                .share_url_for(guid, self.token(), &share_key)
                .map(Some),
            Err(raw) => match Error::from(raw) {
                Error::NoteNotFound => match self.get_note(guid, Some(Scope::Linked))? {
                    Some(found) => self.share_note(&found),
                    None => Ok(None),
                },
                err => Err(err),
            },
        }
    }
}
