//! Credential resolution for linked notebooks, plus the structural token
//! predicates (app-notebook marker, shard identifier).
//!
//! A linked notebook lives on someone else's backend; operating on it
//! requires exchanging the descriptor's share key for a short-lived token
//! minted by that backend. The resolver returns the opened store handle
//! together with the credential so callers address the same endpoint the
//! token is valid for.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Notebook;
use crate::store::records::{AuthenticationResult, LinkedNotebookRecord};
use crate::store::{Gateway, NoteStore};

/// Marker segment embedded in tokens scoped to a single app notebook.
const APP_NOTEBOOK_MARKER: &str = ":B=";

/// Shard identifier segment of an auth token: `S=` followed by `s` and digits.
static SHARD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r":?S=(s[0-9]+):?").unwrap());

/// Whether the token is restricted to an implicit app notebook. Such a
/// token ignores any explicit target notebook on note creation.
pub fn is_app_notebook_token(token: &str) -> bool {
    token.contains(APP_NOTEBOOK_MARKER)
}

/// Extracts the backend shard identifier from an auth token, used to
/// compose public share URLs.
pub fn shard_id_from_token(token: &str) -> Option<String> {
    SHARD_PATTERN
        .captures(token)
        .map(|captures| captures[1].to_string())
}

/// Obtains a scoped credential for a linked notebook. A descriptor
/// without a share key cannot be resolved at all; that is a permission
/// failure decided locally, before any remote call.
pub(crate) fn resolve_shared_access<G: Gateway>(
    gateway: &G,
    base_token: &str,
    linked: &LinkedNotebookRecord,
) -> Result<(Rc<dyn NoteStore>, AuthenticationResult)> {
    let Some(share_key) = linked.share_key.as_deref() else {
        return Err(Error::PermissionDenied("share key".to_string()));
    };
    let store = gateway
        .note_store(&linked.note_store_url)
        .map_err(Error::from)?;
    debug!(notebook = %linked.share_name, "authenticating to shared notebook");
    let auth = store
        .authenticate_to_shared_notebook(share_key, base_token)
        .map_err(Error::from)?;
    Ok((store, auth))
}

/// Fully resolves a linked-notebook descriptor: mint a credential, fetch
/// the canonical shared record it belongs to, and build the merged
/// [`Notebook`] stamped with the scoped token and store handle.
pub(crate) fn notebook_by_linked<G: Gateway>(
    gateway: &G,
    base_token: &str,
    linked: &LinkedNotebookRecord,
) -> Result<Notebook> {
    let (store, auth) = resolve_shared_access(gateway, base_token, linked)?;
    let shared = store
        .get_shared_notebook_by_auth(&auth.authentication_token)
        .map_err(Error::from)?;
    Ok(Notebook::from_linked(
        linked.clone(),
        shared,
        auth.authentication_token,
        store,
    ))
}
