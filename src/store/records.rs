//! Wire records exchanged with the remote service.
//!
//! These are plain data carriers, deserialization-tolerant of missing
//! optional fields so older server responses keep parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account record for the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(default)]
    pub shard_id: Option<String>,
    /// Organization identifier. `Some` means the account is business-enabled.
    #[serde(default)]
    pub business_id: Option<i32>,
}

/// Attributes present on a notebook that is published into an organization.
/// A non-`None` marker on [`NotebookRecord`] means the notebook is visible
/// to the whole organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessNotebookAttributes {
    #[serde(default)]
    pub notebook_description: Option<String>,
    #[serde(default)]
    pub recommended: bool,
}

/// A notebook as listed by a personal or business store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookRecord {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub default_notebook: bool,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub business_notebook: Option<BusinessNotebookAttributes>,
}

/// A sharing relationship: some identity was granted access to a notebook
/// via a share key. `notebook_guid` is the real guid of the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedNotebookRecord {
    pub share_key: String,
    pub notebook_guid: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// A reference to a notebook owned by another account. `guid` identifies
/// the linking record itself, not the target notebook; without a
/// `share_key` the link cannot be resolved to a shared identity at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedNotebookRecord {
    pub guid: String,
    pub share_name: String,
    #[serde(default)]
    pub share_key: Option<String>,
    pub note_store_url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub shard_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteAttributes {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub reminder_time: Option<DateTime<Utc>>,
}

/// An attachment carried by a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(default)]
    pub guid: Option<String>,
    pub mime: String,
    pub data: Vec<u8>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// A note as stored by the service. `guid` is absent until the note has
/// been persisted once; `content` is absent when the caller did not ask
/// for it (see [`NoteFetchSpec`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(default)]
    pub guid: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub notebook_guid: Option<String>,
    #[serde(default)]
    pub attributes: NoteAttributes,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

/// Short-lived credential bundle returned by the authentication procedures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationResult {
    pub authentication_token: String,
    pub note_store_url: String,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

/// Projection flags for `get_note`: which parts of the note the service
/// should include in the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteFetchSpec {
    pub with_content: bool,
    pub with_resources: bool,
    pub with_attributes: bool,
    pub with_shared_notebooks: bool,
}

impl NoteFetchSpec {
    /// The projection every lookup in this crate uses: content and
    /// resources, nothing else.
    pub fn content_and_resources() -> Self {
        Self {
            with_content: true,
            with_resources: true,
            ..Self::default()
        }
    }
}
