//! Save and restore pipelines
//!
//! Each operation is a single sequential pass: select, pack, merge, write
//! for saves; read, verify, extract for restores. A commit's document is
//! always read whole, transformed, and written back whole, so there is no
//! partial-update state to reason about.

use std::collections::BTreeSet;
use std::path::Path;

use crate::archive::{self, ArchiveMember};
use crate::document::NoteDocument;
use crate::error::{PannierError, Result};
use crate::select;
use crate::store::NoteStore;

/// What a save pipeline produced
#[derive(Debug)]
pub struct SaveOutcome {
    pub document: NoteDocument,
    /// False when the save merged into an existing document
    pub created: bool,
    /// Paths matched by this invocation's patterns
    pub selected: Vec<String>,
}

/// Archive files onto the document stored at `commit`.
///
/// Saving onto a commit that already carries a document is additive: the
/// new selection joins the recorded paths and the payload is rebuilt to
/// cover the union, so every previously recorded file must still exist
/// under `base_dir`.
pub fn save(
    store: &dyn NoteStore,
    base_dir: &Path,
    namespace: &str,
    commit: &str,
    patterns: &[String],
    strict: bool,
    message: Option<String>,
) -> Result<SaveOutcome> {
    if let Some(text) = message.as_deref() {
        if text.contains('\n') {
            return Err(PannierError::UsageError(
                "message must be a single line".to_string(),
            ));
        }
    }

    let selected = select::select(base_dir, patterns, strict)?;

    let existing = match store.get(namespace, commit)? {
        Some(text) => Some(NoteDocument::decode(&text)?),
        None => None,
    };

    let mut to_pack: BTreeSet<String> = selected.iter().cloned().collect();
    if let Some(previous) = &existing {
        for prior in &previous.paths {
            if !base_dir.join(prior).is_file() {
                return Err(PannierError::MissingRequiredPath {
                    pattern: prior.clone(),
                });
            }
            to_pack.insert(prior.clone());
        }
    }
    let pack_list: Vec<String> = to_pack.into_iter().collect();
    let payload = archive::pack(base_dir, &pack_list)?;

    let created = existing.is_none();
    let document = NoteDocument::merge(existing, commit, selected.clone(), payload, message);
    store.put(namespace, commit, &document.encode()?, true)?;

    tracing::info!(
        commit = %commit,
        namespace = %namespace,
        paths = document.paths.len(),
        created,
        "saved document"
    );
    Ok(SaveOutcome {
        document,
        created,
        selected,
    })
}

/// What a restore pipeline produced
#[derive(Debug)]
pub struct RestoreOutcome {
    pub document: NoteDocument,
    /// Full archive member list, dry run or not
    pub members: Vec<ArchiveMember>,
    /// Paths actually written; empty on a dry run
    pub written: Vec<String>,
}

/// Extract the document at `commit` into `dest_dir`.
///
/// `dry_run` verifies the payload and reports its members without touching
/// the filesystem. Without `overwrite`, a single colliding target fails the
/// whole call before anything is written.
pub fn restore(
    store: &dyn NoteStore,
    namespace: &str,
    commit: &str,
    dest_dir: &Path,
    overwrite: bool,
    dry_run: bool,
) -> Result<RestoreOutcome> {
    let document = load(store, namespace, commit)?;
    let members = archive::members(&document.payload)?;
    let written = if dry_run {
        Vec::new()
    } else {
        archive::unpack(&document.payload, dest_dir, overwrite)?
    };

    tracing::info!(
        commit = %commit,
        namespace = %namespace,
        members = members.len(),
        written = written.len(),
        dry_run,
        "restored document"
    );
    Ok(RestoreOutcome {
        document,
        members,
        written,
    })
}

/// Fetch and decode the document at `commit`, failing with `NotFound` when
/// the commit carries none.
pub fn load(store: &dyn NoteStore, namespace: &str, commit: &str) -> Result<NoteDocument> {
    match store.get(namespace, commit)? {
        Some(text) => NoteDocument::decode(&text),
        None => Err(PannierError::NotFound {
            commit: commit.to_string(),
            namespace: namespace.to_string(),
        }),
    }
}
