//! Working-tree path selection
//!
//! Resolves user-supplied patterns (literal files, directories, globs)
//! against a base directory into a sorted, deduplicated set of relative
//! paths. Every candidate is canonicalized and must land inside the base
//! directory; `.git` is never selectable.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;
use walkdir::WalkDir;

use crate::error::{PannierError, Result};

/// Resolve `patterns` to repository-relative file paths.
///
/// A pattern is tried as a literal file, then as a directory (archived
/// recursively), then as a glob. With `strict`, a pattern matching nothing
/// fails the whole call; otherwise it is skipped, but an overall empty
/// selection is still an error.
pub fn select(base_dir: &Path, patterns: &[String], strict: bool) -> Result<Vec<String>> {
    let base = base_dir.canonicalize().map_err(|e| PannierError::InvalidSelection {
        reason: format!("cannot resolve base directory {}: {}", base_dir.display(), e),
    })?;

    let mut selected = BTreeSet::new();
    for pattern in patterns {
        let mut matched = Vec::new();
        let literal = base.join(pattern);
        if literal.is_file() {
            matched.push(literal);
        } else if literal.is_dir() {
            collect_files(&literal, &mut matched);
        } else {
            expand_glob(&base, pattern, &mut matched)?;
        }

        if matched.is_empty() {
            if strict {
                return Err(PannierError::MissingRequiredPath {
                    pattern: pattern.clone(),
                });
            }
            tracing::debug!(pattern = %pattern, "pattern matched nothing, skipping");
            continue;
        }

        for path in matched {
            selected.insert(relative_to_base(&base, &path)?);
        }
    }

    if selected.is_empty() {
        return Err(PannierError::InvalidSelection {
            reason: "no files matched any pattern".to_string(),
        });
    }
    Ok(selected.into_iter().collect())
}

/// All regular files under `dir`, skipping `.git` subtrees
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            out.push(entry.path().to_path_buf());
        }
    }
}

/// Match `pattern` against the walk of `base`, shell-style: `*` stays inside
/// one path segment, `**` crosses segments.
fn expand_glob(base: &Path, pattern: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| PannierError::InvalidSelection {
            reason: format!("invalid glob {}: {}", pattern, e),
        })?
        .compile_matcher();

    for entry in WalkDir::new(base)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(base) else {
            continue;
        };
        if matcher.is_match(rel) {
            out.push(entry.path().to_path_buf());
        }
    }
    Ok(())
}

/// Canonicalize a matched file and render it relative to `base` with
/// forward slashes. Fails when the file resolves outside `base` (symlink
/// escapes included) or into `.git`, or when the path is not valid UTF-8.
fn relative_to_base(base: &Path, candidate: &Path) -> Result<String> {
    let canonical = candidate.canonicalize().map_err(|e| PannierError::InvalidSelection {
        reason: format!("cannot resolve {}: {}", candidate.display(), e),
    })?;
    let rel = canonical
        .strip_prefix(base)
        .map_err(|_| PannierError::InvalidSelection {
            reason: format!("{} resolves outside the base directory", candidate.display()),
        })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                let text = part.to_str().ok_or_else(|| PannierError::InvalidSelection {
                    reason: format!("path is not valid UTF-8: {}", candidate.display()),
                })?;
                parts.push(text);
            }
            _ => {
                return Err(PannierError::InvalidSelection {
                    reason: format!("unexpected path component in {}", candidate.display()),
                })
            }
        }
    }
    // nested repositories (vendored checkouts, submodules) count too
    if parts.iter().any(|part| *part == ".git") {
        return Err(PannierError::InvalidSelection {
            reason: format!("refusing to select repository internals: {}", candidate.display()),
        });
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "PRD.md");
        write_file(tmp.path(), "notes.txt");
        write_file(tmp.path(), "docs/PLAN.md");
        write_file(tmp.path(), "docs/deep/API.md");
        write_file(tmp.path(), ".git/config");
        tmp
    }

    #[test]
    fn test_literal_file() {
        let tmp = fixture();
        let got = select(tmp.path(), &["PRD.md".to_string()], true).unwrap();
        assert_eq!(got, vec!["PRD.md"]);
    }

    #[test]
    fn test_directory_recurses() {
        let tmp = fixture();
        let got = select(tmp.path(), &["docs".to_string()], true).unwrap();
        assert_eq!(got, vec!["docs/PLAN.md", "docs/deep/API.md"]);
    }

    #[test]
    fn test_glob_stays_in_segment() {
        let tmp = fixture();
        let got = select(tmp.path(), &["*.md".to_string()], true).unwrap();
        assert_eq!(got, vec!["PRD.md"]);
    }

    #[test]
    fn test_recursive_glob() {
        let tmp = fixture();
        let got = select(tmp.path(), &["**/*.md".to_string()], true).unwrap();
        assert_eq!(got, vec!["PRD.md", "docs/PLAN.md", "docs/deep/API.md"]);
    }

    #[test]
    fn test_overlapping_patterns_dedupe() {
        let tmp = fixture();
        let got = select(
            tmp.path(),
            &["docs".to_string(), "docs/PLAN.md".to_string()],
            true,
        )
        .unwrap();
        assert_eq!(got, vec!["docs/PLAN.md", "docs/deep/API.md"]);
    }

    #[test]
    fn test_strict_missing_pattern_fails() {
        let tmp = fixture();
        let err = select(
            tmp.path(),
            &["PRD.md".to_string(), "missing.md".to_string()],
            true,
        )
        .unwrap_err();
        match err {
            PannierError::MissingRequiredPath { pattern } => assert_eq!(pattern, "missing.md"),
            other => panic!("expected MissingRequiredPath, got {other:?}"),
        }
    }

    #[test]
    fn test_lenient_skips_missing() {
        let tmp = fixture();
        let got = select(
            tmp.path(),
            &["missing.md".to_string(), "PRD.md".to_string()],
            false,
        )
        .unwrap();
        assert_eq!(got, vec!["PRD.md"]);
    }

    #[test]
    fn test_lenient_with_nothing_matched_fails() {
        let tmp = fixture();
        let err = select(tmp.path(), &["missing.md".to_string()], false).unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));
    }

    #[test]
    fn test_traversal_is_rejected() {
        let outer = TempDir::new().unwrap();
        write_file(outer.path(), "outside.txt");
        let base = outer.path().join("repo");
        fs::create_dir_all(&base).unwrap();
        write_file(&base, "inside.txt");

        let err = select(&base, &["../outside.txt".to_string()], true).unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        let outer = TempDir::new().unwrap();
        write_file(outer.path(), "secret.txt");
        let base = outer.path().join("repo");
        fs::create_dir_all(&base).unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), base.join("alias.txt"))
            .unwrap();

        let err = select(&base, &["alias.txt".to_string()], true).unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_base_is_followed() {
        let tmp = fixture();
        std::os::unix::fs::symlink(tmp.path().join("PRD.md"), tmp.path().join("alias.md"))
            .unwrap();

        let got = select(tmp.path(), &["alias.md".to_string()], true).unwrap();
        assert_eq!(got, vec!["PRD.md"]);
    }

    #[test]
    fn test_git_dir_is_never_selected() {
        let tmp = fixture();

        let err = select(tmp.path(), &[".git/config".to_string()], true).unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));

        // walks and globs silently skip it
        let got = select(tmp.path(), &["**/*".to_string()], true).unwrap();
        assert!(got.iter().all(|p| !p.starts_with(".git")));
    }

    #[test]
    fn test_nested_git_dir_is_never_selected() {
        let tmp = fixture();
        write_file(tmp.path(), "vendor/dep/.git/config");
        write_file(tmp.path(), "vendor/dep/README.md");

        // a literal path into a vendored repository's internals is refused,
        // not packed into a document that extraction would then reject
        let err = select(
            tmp.path(),
            &["vendor/dep/.git/config".to_string()],
            true,
        )
        .unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));

        let got = select(tmp.path(), &["vendor".to_string()], true).unwrap();
        assert_eq!(got, vec!["vendor/dep/README.md"]);
    }

    #[test]
    fn test_bad_glob_is_invalid_selection() {
        let tmp = fixture();
        let err = select(tmp.path(), &["docs/[".to_string()], true).unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));
    }
}
