//! # Notebook Aggregation
//!
//! `list_notebooks` produces the one catalog a caller sees: every
//! notebook reachable from this account, across all authorization
//! domains, deduplicated by guid.
//!
//! The merge runs in domain order:
//!
//! 1. Personal notebooks seed the catalog. The sharing relationships the
//!    user has granted on them are collected first, so each `Notebook`
//!    is built once with its `is_shared` flag already decided.
//! 2. Linked-notebook descriptors extend it. An account without the
//!    linking capability reports a user-level error on the listing call;
//!    that means an empty set, not a failure.
//! 3. For a business-enabled account, the organization's shared
//!    relationships and notebook catalog reconcile each descriptor
//!    without per-notebook credential calls. A notebook counts as shared
//!    when its guid is the target of more than one organizational share,
//!    or when it is published organization-wide.
//! 4. Descriptors the organization cannot account for, and every
//!    descriptor on a non-business account, go through the full
//!    per-notebook credential protocol.
//!
//! Order is personal listing order, then descriptor listing order. A
//! resolution that lands on an already-present guid merges into the
//! existing entry instead of appending a duplicate.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::auth;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::model::Notebook;
use crate::store::records::{LinkedNotebookRecord, NotebookRecord, SharedNotebookRecord};
use crate::store::Gateway;

impl<G: Gateway> Client<G> {
    /// Lists every notebook the user can reach, merged by guid.
    pub fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        let personal = self.list_personal_notebooks()?;
        let shared = self.list_shared_notebook_records()?;
        let shared_guids: HashSet<&str> =
            shared.iter().map(|record| record.notebook_guid.as_str()).collect();

        let mut catalog = Catalog::default();
        for record in personal {
            let is_shared = shared_guids.contains(record.guid.as_str());
            catalog.insert(Notebook::from_personal(record, is_shared));
        }

        let linked = match self.list_linked_notebook_records() {
            Ok(linked) => linked,
            // No linking capability on this account: an empty set.
            Err(Error::InvalidInput(reason)) => {
                debug!(%reason, "account cannot list linked notebooks");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        if linked.is_empty() {
            return Ok(catalog.into_notebooks());
        }

        if self.is_business_user()? {
            self.merge_business_links(linked, &mut catalog)?;
        } else {
            self.merge_personal_links(linked, &mut catalog)?;
        }
        Ok(catalog.into_notebooks())
    }

    fn merge_personal_links(
        &self,
        linked: Vec<LinkedNotebookRecord>,
        catalog: &mut Catalog,
    ) -> Result<()> {
        for descriptor in linked {
            match auth::notebook_by_linked(self.gateway(), self.token(), &descriptor) {
                Ok(notebook) => catalog.insert(notebook),
                // No usable access to this share; leave it out.
                Err(Error::PermissionDenied(resource)) => {
                    debug!(notebook = %descriptor.share_name, %resource, "skipping linked notebook");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn merge_business_links(
        &self,
        linked: Vec<LinkedNotebookRecord>,
        catalog: &mut Catalog,
    ) -> Result<()> {
        let business_shared = self.business_shared_notebook_records()?;
        let business_records = self.business_notebook_records()?;

        let mut guid_occurrences: HashMap<&str, usize> = HashMap::new();
        for record in &business_shared {
            *guid_occurrences
                .entry(record.notebook_guid.as_str())
                .or_insert(0) += 1;
        }
        let by_share_key: HashMap<&str, &SharedNotebookRecord> = business_shared
            .iter()
            .map(|record| (record.share_key.as_str(), record))
            .collect();
        let by_guid: HashMap<&str, &NotebookRecord> = business_records
            .iter()
            .map(|record| (record.guid.as_str(), record))
            .collect();

        for descriptor in linked {
            // Without a share key there is nothing to resolve this link by.
            let Some(share_key) = descriptor.share_key.as_deref() else {
                continue;
            };
            let reconciled = by_share_key.get(share_key).and_then(|shared| {
                by_guid
                    .get(shared.notebook_guid.as_str())
                    .map(|business| (*shared, *business))
            });
            match reconciled {
                Some((shared, business)) => {
                    let shared_more_than_once = guid_occurrences
                        .get(shared.notebook_guid.as_str())
                        .is_some_and(|count| *count > 1);
                    let is_shared =
                        shared_more_than_once || business.business_notebook.is_some();
                    catalog.insert(Notebook::from_business(
                        business.clone(),
                        descriptor.clone(),
                        shared.clone(),
                        is_shared,
                    ));
                }
                // The organization cannot account for this link; resolve
                // it the expensive way, dropping it on any failure.
                None => match auth::notebook_by_linked(self.gateway(), self.token(), &descriptor) {
                    Ok(notebook) => catalog.insert(notebook),
                    Err(err) => {
                        debug!(notebook = %descriptor.share_name, %err, "dropping unresolvable linked notebook");
                    }
                },
            }
        }
        Ok(())
    }
}

/// Result accumulator: preserves listing order and merges guid collisions
/// instead of appending duplicates.
#[derive(Default)]
struct Catalog {
    notebooks: Vec<Notebook>,
    by_guid: HashMap<String, usize>,
}

impl Catalog {
    fn insert(&mut self, notebook: Notebook) {
        if let Some(guid) = notebook.guid.clone() {
            if let Some(&at) = self.by_guid.get(&guid) {
                self.notebooks[at].merge_from(notebook);
                return;
            }
            self.by_guid.insert(guid, self.notebooks.len());
        }
        self.notebooks.push(notebook);
    }

    fn into_notebooks(self) -> Vec<Notebook> {
        self.notebooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryNoteStore;

    fn named(guid: &str) -> Notebook {
        Notebook::from_personal(
            NotebookRecord {
                guid: guid.to_string(),
                name: guid.to_string(),
                ..Default::default()
            },
            false,
        )
    }

    #[test]
    fn insert_preserves_first_seen_order() {
        let mut catalog = Catalog::default();
        catalog.insert(named("b"));
        catalog.insert(named("a"));
        catalog.insert(named("c"));
        let guids: Vec<_> = catalog
            .into_notebooks()
            .into_iter()
            .map(|nb| nb.guid.unwrap())
            .collect();
        assert_eq!(guids, ["b", "a", "c"]);
    }

    #[test]
    fn insert_merges_guid_collisions() {
        let mut catalog = Catalog::default();
        catalog.insert(named("a"));

        let store = InMemoryNoteStore::detached("https://shard2.example.com/notestore", "remote");
        let resolved = Notebook::from_linked(
            LinkedNotebookRecord {
                guid: "link-a".to_string(),
                share_name: "a".to_string(),
                share_key: Some("sk".to_string()),
                note_store_url: "https://shard2.example.com/notestore".to_string(),
                username: None,
                shard_id: None,
            },
            SharedNotebookRecord {
                share_key: "sk".to_string(),
                notebook_guid: "a".to_string(),
                username: None,
            },
            "scoped".to_string(),
            store,
        );
        catalog.insert(resolved);

        let notebooks = catalog.into_notebooks();
        assert_eq!(notebooks.len(), 1);
        assert!(notebooks[0].is_linked());
        assert_eq!(notebooks[0].auth_token.as_deref(), Some("scoped"));
    }

    #[test]
    fn guidless_entries_never_collide() {
        let mut catalog = Catalog::default();
        catalog.insert(Notebook::default());
        catalog.insert(Notebook::default());
        assert_eq!(catalog.into_notebooks().len(), 2);
    }
}
