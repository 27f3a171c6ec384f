//! Note document model
//!
//! A note document is the unit of state attached to one commit: a YAML
//! header (schema, timestamps, message, path list, rewrite history)
//! terminated by a `---` line, followed by the base64 payload produced by
//! the archive codec. One document exists per (namespace, commit) pair;
//! every change goes through [`NoteDocument::merge`] or
//! [`NoteDocument::add_history`] so the creation timestamp and the rewrite
//! history only ever grow.

use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PannierError, Result};

/// Schema version written by this build; decode rejects any other
pub const SCHEMA_VERSION: u32 = 1;

/// Payload transform tag; the only encoding this version reads or writes
pub const PAYLOAD_ENCODING: &str = "tar+gzip+base64";

/// Line separating the YAML header from the payload text
const HEADER_TERMINATOR: &str = "---";

/// The structured record attached to one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDocument {
    /// Document schema version (required, must equal [`SCHEMA_VERSION`])
    pub schema_version: u32,
    /// Payload transform tag (required, must equal [`PAYLOAD_ENCODING`])
    pub encoding: String,
    /// Set once at first creation, preserved by every later merge
    pub created_at: DateTime<Utc>,
    /// Set on every merge after the first creation; absent on a fresh document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Commit the document was created against (informational; rewrites may
    /// move the document to a new identifier without touching this field)
    pub commit: String,
    /// Optional free-text annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Prior identifiers this document's commit has held, discovery order.
    /// Serialized even when empty so readers agree on the schema shape;
    /// absent in pre-history documents, which decode as empty.
    #[serde(default)]
    pub commit_history: Vec<String>,
    /// Repository-relative files in the payload, sorted and deduplicated
    pub paths: Vec<String>,
    /// Base64 payload text; lives below the `---` line, not in the header
    #[serde(skip)]
    pub payload: String,
}

/// Current time truncated to whole seconds, so headers serialize as
/// `2026-01-24T12:34:56Z` and round-trip exactly.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Sorted union of two path lists with duplicates collapsed
fn union_paths(existing: &[String], added: Vec<String>) -> Vec<String> {
    let mut set: BTreeSet<String> = existing.iter().cloned().collect();
    set.extend(added);
    set.into_iter().collect()
}

impl NoteDocument {
    /// Create a fresh document for a commit with no prior note
    pub fn create(
        commit: impl Into<String>,
        paths: Vec<String>,
        payload: String,
        message: Option<String>,
    ) -> Self {
        NoteDocument {
            schema_version: SCHEMA_VERSION,
            encoding: PAYLOAD_ENCODING.to_string(),
            created_at: now(),
            updated_at: None,
            commit: commit.into(),
            message,
            commit_history: Vec::new(),
            paths: union_paths(&[], paths),
            payload,
        }
    }

    /// Merge a save into an optional prior document.
    ///
    /// With no prior document this is [`NoteDocument::create`]. With one,
    /// `paths` is the union of old and new (a second save never loses
    /// previously archived files), the payload is replaced by the caller's
    /// re-pack of that union, `created_at` and `commit_history` carry over
    /// unchanged, `updated_at` is refreshed, and a supplied message replaces
    /// the prior one while `None` retains it.
    pub fn merge(
        existing: Option<NoteDocument>,
        commit: &str,
        paths: Vec<String>,
        payload: String,
        message: Option<String>,
    ) -> NoteDocument {
        match existing {
            None => NoteDocument::create(commit, paths, payload, message),
            Some(prev) => NoteDocument {
                schema_version: SCHEMA_VERSION,
                encoding: PAYLOAD_ENCODING.to_string(),
                created_at: prev.created_at,
                updated_at: Some(now()),
                commit: prev.commit,
                message: message.or(prev.message),
                commit_history: prev.commit_history,
                paths: union_paths(&prev.paths, paths),
                payload,
            },
        }
    }

    /// Append a prior identifier to the rewrite history.
    ///
    /// Returns `false` without touching the document when `old_id` is
    /// already recorded, which is what makes replayed rewrite notifications
    /// harmless. On a genuine append `updated_at` is refreshed.
    pub fn add_history(&mut self, old_id: &str) -> bool {
        if self.commit_history.iter().any(|id| id == old_id) {
            return false;
        }
        self.commit_history.push(old_id.to_string());
        self.updated_at = Some(now());
        true
    }

    /// Serialize to the persisted text form: YAML header, `---`, payload
    pub fn encode(&self) -> Result<String> {
        let header = serde_yaml::to_string(self)?;
        let mut out = String::with_capacity(header.len() + self.payload.len() + 8);
        out.push_str(&header);
        out.push_str(HEADER_TERMINATOR);
        out.push('\n');
        out.push_str(&self.payload);
        if !self.payload.is_empty() && !self.payload.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse the persisted text form back into a document.
    ///
    /// A missing terminator or unparsable header is
    /// [`PannierError::MalformedDocument`]; a well-formed header carrying an
    /// unsupported `schemaVersion` or `encoding` is the distinct
    /// [`PannierError::SchemaMismatch`].
    pub fn decode(text: &str) -> Result<NoteDocument> {
        let (header, payload) = split_document(text)?;

        let mut doc: NoteDocument =
            serde_yaml::from_str(header).map_err(|e| PannierError::MalformedDocument {
                reason: e.to_string(),
            })?;

        if doc.schema_version != SCHEMA_VERSION {
            return Err(PannierError::SchemaMismatch {
                field: "schemaVersion",
                found: doc.schema_version.to_string(),
                supported: SCHEMA_VERSION.to_string(),
            });
        }
        if doc.encoding != PAYLOAD_ENCODING {
            return Err(PannierError::SchemaMismatch {
                field: "encoding",
                found: doc.encoding.clone(),
                supported: PAYLOAD_ENCODING.to_string(),
            });
        }

        doc.payload = payload.trim().to_string();
        Ok(doc)
    }
}

/// Split the persisted text at the first line that is exactly `---`.
///
/// Header scalars are single-line by construction (multi-line messages are
/// rejected before a document is built), so the first bare `---` line is
/// always the terminator.
fn split_document(text: &str) -> Result<(&str, &str)> {
    let mut cursor = 0usize;
    for line in text.split_inclusive('\n') {
        let stripped = line.strip_suffix('\n').unwrap_or(line);
        let stripped = stripped.strip_suffix('\r').unwrap_or(stripped);
        if stripped == HEADER_TERMINATOR {
            return Ok((&text[..cursor], &text[cursor + line.len()..]));
        }
        cursor += line.len();
    }
    Err(PannierError::MalformedDocument {
        reason: "missing `---` header terminator".to_string(),
    })
}
