//! Opaque note storage
//!
//! Higher layers read and write whole note texts keyed by (namespace,
//! commit id) and never see how they are persisted. [`crate::git::GitNotes`]
//! is the real backend; [`MemoryStore`] backs unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::{PannierError, Result};

/// Keyed storage for note document texts.
///
/// `commit` is always a full object id by the time it reaches a store;
/// revision spelling is resolved by the caller.
pub trait NoteStore {
    /// Fetch the text at `commit`, `None` when nothing is stored there
    fn get(&self, namespace: &str, commit: &str) -> Result<Option<String>>;

    /// Store `text` at `commit`. Without `overwrite`, an existing entry is
    /// an error.
    fn put(&self, namespace: &str, commit: &str, text: &str, overwrite: bool) -> Result<()>;

    /// Duplicate the text at `from` onto `to`, which must be empty
    fn copy(&self, namespace: &str, from: &str, to: &str) -> Result<()>;

    /// Delete the entry at `commit`, erroring when there is none
    fn remove(&self, namespace: &str, commit: &str) -> Result<()>;

    /// Commit ids carrying an entry, in no particular order
    fn list(&self, namespace: &str) -> Result<Vec<String>>;
}

/// In-memory store with `git notes` semantics
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: RefCell<BTreeMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, commit: &str) -> (String, String) {
        (namespace.to_string(), commit.to_string())
    }
}

impl NoteStore for MemoryStore {
    fn get(&self, namespace: &str, commit: &str) -> Result<Option<String>> {
        Ok(self.notes.borrow().get(&Self::key(namespace, commit)).cloned())
    }

    fn put(&self, namespace: &str, commit: &str, text: &str, overwrite: bool) -> Result<()> {
        let mut notes = self.notes.borrow_mut();
        let key = Self::key(namespace, commit);
        if !overwrite && notes.contains_key(&key) {
            return Err(PannierError::Git {
                operation: "notes add".to_string(),
                detail: format!("note already exists for {}", commit),
            });
        }
        notes.insert(key, text.to_string());
        Ok(())
    }

    fn copy(&self, namespace: &str, from: &str, to: &str) -> Result<()> {
        let mut notes = self.notes.borrow_mut();
        let Some(text) = notes.get(&Self::key(namespace, from)).cloned() else {
            return Err(PannierError::NotFound {
                commit: from.to_string(),
                namespace: namespace.to_string(),
            });
        };
        let key = Self::key(namespace, to);
        if notes.contains_key(&key) {
            return Err(PannierError::Git {
                operation: "notes copy".to_string(),
                detail: format!("note already exists for {}", to),
            });
        }
        notes.insert(key, text);
        Ok(())
    }

    fn remove(&self, namespace: &str, commit: &str) -> Result<()> {
        if self.notes.borrow_mut().remove(&Self::key(namespace, commit)).is_none() {
            return Err(PannierError::NotFound {
                commit: commit.to_string(),
                namespace: namespace.to_string(),
            });
        }
        Ok(())
    }

    fn list(&self, namespace: &str) -> Result<Vec<String>> {
        Ok(self
            .notes
            .borrow()
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, commit)| commit.clone())
            .collect())
    }
}
