//! CLI commands for pannier

pub mod dispatch;
pub mod hooks;
pub mod list;
pub mod remove;
pub mod restore;
pub mod save;
pub mod show;
pub mod sync;

/// Shorten a full object id for human-readable output.
///
/// History entries come out of decoded documents, not git, so the input is
/// not guaranteed to be hex; truncation stays on a char boundary.
pub(crate) fn short_id(commit: &str) -> &str {
    match commit.char_indices().nth(12) {
        Some((end, _)) => &commit[..end],
        None => commit,
    }
}
