//! Configuration resolution
//!
//! Both knobs follow the same precedence: command-line flag (the CLI also
//! maps environment variables onto flags), then repository git config, then
//! the built-in default.

use crate::error::{PannierError, Result};
use crate::git::GitNotes;

/// Notes namespace used when nothing else is configured
pub const DEFAULT_NAMESPACE: &str = "pannier";
/// Remote used by push/fetch when nothing else is configured
pub const DEFAULT_REMOTE: &str = "origin";

pub const NAMESPACE_KEY: &str = "pannier.namespace";
pub const REMOTE_KEY: &str = "pannier.remote";

pub fn resolve_namespace(notes: &GitNotes, flag: Option<&str>) -> Result<String> {
    if let Some(namespace) = flag {
        return validated_namespace(namespace);
    }
    if let Some(namespace) = notes.config_get(NAMESPACE_KEY)? {
        return validated_namespace(&namespace);
    }
    Ok(DEFAULT_NAMESPACE.to_string())
}

pub fn resolve_remote(notes: &GitNotes, flag: Option<&str>) -> Result<String> {
    if let Some(remote) = flag {
        return Ok(remote.to_string());
    }
    if let Some(remote) = notes.config_get(REMOTE_KEY)? {
        return Ok(remote);
    }
    Ok(DEFAULT_REMOTE.to_string())
}

/// A namespace becomes part of `refs/notes/<namespace>`, so it must be a
/// sane ref suffix.
fn validated_namespace(namespace: &str) -> Result<String> {
    let bad_shape = namespace.is_empty()
        || namespace.starts_with('/')
        || namespace.ends_with('/')
        || namespace.contains("..")
        || namespace.chars().any(|c| c.is_whitespace() || c == ':' || c == '~' || c == '^');
    if bad_shape {
        return Err(PannierError::UsageError(format!(
            "invalid notes namespace: {:?}",
            namespace
        )));
    }
    Ok(namespace.to_string())
}
