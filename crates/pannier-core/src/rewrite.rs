//! Rewrite history tracking
//!
//! Keeps note documents attached when commits are rewritten. Git's
//! post-rewrite hook supplies `<old-id> <new-id>` pairs on stdin; for each
//! pair the note is first made reachable at the new id, then the document's
//! header records where it came from.

use std::io::BufRead;

use serde::Serialize;

use crate::document::NoteDocument;
use crate::error::Result;
use crate::store::NoteStore;

/// What recording one rewrite pair did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// No document at the new id, nothing to annotate
    Absent,
    /// The old id was already in the history
    AlreadyRecorded,
    /// History extended and the document rewritten
    Recorded,
}

/// Append `old_id` to the history of the document stored at `new_id`.
///
/// Absent documents and already-recorded ids are quiet no-ops, so replaying
/// the same notification stream is safe.
pub fn record_rewrite(
    store: &dyn NoteStore,
    namespace: &str,
    old_id: &str,
    new_id: &str,
) -> Result<RewriteOutcome> {
    // A degenerate old == new pair must not put a document's own id into
    // its history.
    if old_id == new_id {
        return Ok(RewriteOutcome::AlreadyRecorded);
    }
    let Some(text) = store.get(namespace, new_id)? else {
        return Ok(RewriteOutcome::Absent);
    };
    let mut document = NoteDocument::decode(&text)?;
    if !document.add_history(old_id) {
        return Ok(RewriteOutcome::AlreadyRecorded);
    }
    store.put(namespace, new_id, &document.encode()?, true)?;
    tracing::debug!(old = %old_id, new = %new_id, "recorded rewrite");
    Ok(RewriteOutcome::Recorded)
}

/// Tally of one notification stream
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RewriteSummary {
    /// Well-formed pairs seen
    pub pairs: usize,
    /// Notes copied from an old id to a new one
    pub copied: usize,
    /// Documents whose history grew
    pub recorded: usize,
}

/// Process a post-rewrite notification stream.
///
/// Each line carries `<old-id> <new-id>`; blank lines are skipped and a
/// line without two ids is logged and skipped rather than aborting the
/// remaining pairs. When the old commit has a note and the new one does
/// not, the note is copied across before its history is updated.
pub fn process_rewrites<R: BufRead>(
    store: &dyn NoteStore,
    namespace: &str,
    input: R,
) -> Result<RewriteSummary> {
    let mut summary = RewriteSummary::default();
    for line in input.lines() {
        let line = line?;
        let mut ids = line.split_whitespace();
        let (Some(old_id), Some(new_id)) = (ids.next(), ids.next()) else {
            if !line.trim().is_empty() {
                tracing::warn!(line = %line, "ignoring malformed rewrite notification");
            }
            continue;
        };
        summary.pairs += 1;

        if store.get(namespace, new_id)?.is_none() && store.get(namespace, old_id)?.is_some() {
            store.copy(namespace, old_id, new_id)?;
            summary.copied += 1;
        }
        if record_rewrite(store, namespace, old_id, new_id)? == RewriteOutcome::Recorded {
            summary.recorded += 1;
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NS: &str = "pannier";

    fn seeded_store(commit: &str) -> MemoryStore {
        let store = MemoryStore::new();
        let document = NoteDocument::create(
            commit.to_string(),
            vec!["PRD.md".to_string()],
            "cGF5bG9hZA==".to_string(),
            None,
        );
        store.put(NS, commit, &document.encode().unwrap(), false).unwrap();
        store
    }

    fn history_at(store: &MemoryStore, commit: &str) -> Vec<String> {
        let text = store.get(NS, commit).unwrap().unwrap();
        NoteDocument::decode(&text).unwrap().commit_history
    }

    #[test]
    fn test_record_appends_once() {
        let store = seeded_store("new1");
        assert_eq!(
            record_rewrite(&store, NS, "old1", "new1").unwrap(),
            RewriteOutcome::Recorded
        );
        assert_eq!(history_at(&store, "new1"), vec!["old1"]);

        assert_eq!(
            record_rewrite(&store, NS, "old1", "new1").unwrap(),
            RewriteOutcome::AlreadyRecorded
        );
        assert_eq!(history_at(&store, "new1"), vec!["old1"]);
    }

    #[test]
    fn test_record_without_document_is_a_noop() {
        let store = MemoryStore::new();
        assert_eq!(
            record_rewrite(&store, NS, "old1", "new1").unwrap(),
            RewriteOutcome::Absent
        );
        assert_eq!(store.get(NS, "new1").unwrap(), None);
    }

    #[test]
    fn test_record_ignores_self_pair() {
        let store = seeded_store("same");
        assert_eq!(
            record_rewrite(&store, NS, "same", "same").unwrap(),
            RewriteOutcome::AlreadyRecorded
        );
        assert!(history_at(&store, "same").is_empty());
    }

    #[test]
    fn test_process_copies_then_records() {
        let store = seeded_store("aaa");
        let summary = process_rewrites(&store, NS, "aaa bbb\n".as_bytes()).unwrap();
        assert_eq!(summary.pairs, 1);
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.recorded, 1);

        assert_eq!(history_at(&store, "bbb"), vec!["aaa"]);
        // the note at the old id is left in place
        assert!(store.get(NS, "aaa").unwrap().is_some());
    }

    #[test]
    fn test_process_chain_accumulates_history() {
        let store = seeded_store("aaa");
        process_rewrites(&store, NS, "aaa bbb\nbbb ccc\n".as_bytes()).unwrap();
        assert_eq!(history_at(&store, "ccc"), vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_process_is_idempotent() {
        let store = seeded_store("aaa");
        let input = "aaa bbb\nbbb ccc\n";
        process_rewrites(&store, NS, input.as_bytes()).unwrap();
        let summary = process_rewrites(&store, NS, input.as_bytes()).unwrap();
        assert_eq!(summary.copied, 0);
        assert_eq!(summary.recorded, 0);
        assert_eq!(history_at(&store, "ccc"), vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_process_skips_malformed_lines() {
        let store = seeded_store("aaa");
        let summary =
            process_rewrites(&store, NS, "\nonly-one-token\naaa bbb\n".as_bytes()).unwrap();
        assert_eq!(summary.pairs, 1);
        assert_eq!(history_at(&store, "bbb"), vec!["aaa"]);
    }

    #[test]
    fn test_process_ignores_extra_columns() {
        // git may append flags after the two ids
        let store = seeded_store("aaa");
        let summary = process_rewrites(&store, NS, "aaa bbb extra\n".as_bytes()).unwrap();
        assert_eq!(summary.pairs, 1);
        assert_eq!(history_at(&store, "bbb"), vec!["aaa"]);
    }

    #[test]
    fn test_process_without_notes_is_quiet() {
        let store = MemoryStore::new();
        let summary = process_rewrites(&store, NS, "aaa bbb\n".as_bytes()).unwrap();
        assert_eq!(summary.pairs, 1);
        assert_eq!(summary.copied, 0);
        assert_eq!(summary.recorded, 0);
    }
}
