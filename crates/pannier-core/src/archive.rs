//! Archive codec
//!
//! Turns a selected file set into the text-safe payload embedded in a note
//! document (tar, then gzip, then base64) and back. Members are archived in
//! sorted path order so repeated packs of the same selection produce
//! diff-friendly output. Extraction is all-or-nothing: the full member list
//! is verified and checked for destination collisions before anything is
//! written.

use std::fs;
use std::io::Read;
use std::path::{Component, Path};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{PannierError, Result};

/// Column width for the wrapped base64 payload text
const BASE64_WRAP: usize = 76;

/// One file reported by a payload listing
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArchiveMember {
    /// Repository-relative path, forward slashes
    pub path: String,
    /// Uncompressed size in bytes
    pub size: u64,
}

/// Pack files under `base_dir` into wrapped base64 text.
///
/// Paths are archived relative with `append_path_with_name`, preserving file
/// mode and regular-file content.
#[tracing::instrument(skip(base_dir, paths), fields(count = paths.len()))]
pub fn pack(base_dir: &Path, paths: &[String]) -> Result<String> {
    if paths.is_empty() {
        return Err(PannierError::InvalidSelection {
            reason: "refusing to pack an empty file set".to_string(),
        });
    }

    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for rel in sorted {
        builder.append_path_with_name(base_dir.join(rel), rel)?;
    }
    let compressed = builder.into_inner()?.finish()?;

    Ok(wrap_text(&general_purpose::STANDARD.encode(&compressed)))
}

/// Extract a payload into `dest_dir`, returning the written paths.
///
/// Without `overwrite`, any already-existing target fails the whole call
/// before a single byte is written; with it, existing files are replaced.
/// Overwrite never replaces directory structure, so a directory at a target
/// or a plain file where a member needs a directory fails in both modes.
/// Missing parent directories are created either way.
#[tracing::instrument(skip(payload, dest_dir), fields(dest = %dest_dir.display()))]
pub fn unpack(payload: &str, dest_dir: &Path, overwrite: bool) -> Result<Vec<String>> {
    let raw = decode_payload(payload)?;

    let members = scan_members(&raw)?;
    for member in &members {
        let target = dest_dir.join(&member.path);
        if target.exists() && (!overwrite || target.is_dir()) {
            return Err(PannierError::DestinationConflict { path: target });
        }
        // target.exists() is false when an ancestor is a plain file, so the
        // ancestors up to the destination root are checked one by one
        let mut ancestor = target.parent();
        while let Some(dir) = ancestor {
            if dir == dest_dir {
                break;
            }
            if dir.exists() && !dir.is_dir() {
                return Err(PannierError::DestinationConflict {
                    path: dir.to_path_buf(),
                });
            }
            ancestor = dir.parent();
        }
    }

    let mut archive = tar::Archive::new(raw.as_slice());
    archive.set_preserve_permissions(true);
    let mut written = Vec::with_capacity(members.len());
    for entry in archive.entries().map_err(malformed_archive)? {
        let mut entry = entry.map_err(malformed_archive)?;
        let rel = checked_member_path(&entry)?;
        let target = dest_dir.join(&rel);
        if entry.header().entry_type() == tar::EntryType::Directory {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
        written.push(rel);
    }

    Ok(written)
}

/// Report the member list of a payload without writing anything.
///
/// Runs the same per-member safety verification as extraction, so an unsafe
/// payload is rejected here too.
pub fn members(payload: &str) -> Result<Vec<ArchiveMember>> {
    let raw = decode_payload(payload)?;
    scan_members(&raw)
}

/// base64 text -> gzip bytes -> tar bytes
fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let compact: String = payload.split_whitespace().collect();
    let compressed = general_purpose::STANDARD.decode(compact.as_bytes()).map_err(|e| {
        PannierError::MalformedDocument {
            reason: format!("payload is not valid base64: {}", e),
        }
    })?;

    let mut raw = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(|e| PannierError::MalformedDocument {
            reason: format!("payload is not valid gzip: {}", e),
        })?;
    Ok(raw)
}

/// Walk every entry, verifying safety, and collect the regular files
fn scan_members(raw: &[u8]) -> Result<Vec<ArchiveMember>> {
    let mut archive = tar::Archive::new(raw);
    let mut members = Vec::new();
    for entry in archive.entries().map_err(malformed_archive)? {
        let entry = entry.map_err(malformed_archive)?;
        let path = checked_member_path(&entry)?;
        match entry.header().entry_type() {
            tar::EntryType::Regular => members.push(ArchiveMember {
                path,
                size: entry.size(),
            }),
            tar::EntryType::Directory => {}
            other => {
                return Err(PannierError::UnsafeArchiveMember {
                    member: path,
                    reason: format!("unsupported entry type {:?}", other),
                })
            }
        }
    }
    Ok(members)
}

/// Validate one member path: relative, no `..`, no `.git`, valid UTF-8
fn checked_member_path<R: Read>(entry: &tar::Entry<'_, R>) -> Result<String> {
    let bytes = entry.path_bytes();
    let text = std::str::from_utf8(&bytes).map_err(|_| PannierError::UnsafeArchiveMember {
        member: String::from_utf8_lossy(&bytes).into_owned(),
        reason: "member name is not valid UTF-8".to_string(),
    })?;
    if text.is_empty() {
        return Err(PannierError::UnsafeArchiveMember {
            member: text.to_string(),
            reason: "empty member name".to_string(),
        });
    }

    for component in Path::new(text).components() {
        match component {
            Component::Normal(part) if part == ".git" => {
                return Err(PannierError::UnsafeArchiveMember {
                    member: text.to_string(),
                    reason: "member writes into .git".to_string(),
                })
            }
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(PannierError::UnsafeArchiveMember {
                    member: text.to_string(),
                    reason: "parent-directory traversal".to_string(),
                })
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PannierError::UnsafeArchiveMember {
                    member: text.to_string(),
                    reason: "absolute path".to_string(),
                })
            }
        }
    }

    Ok(text.trim_end_matches('/').to_string())
}

fn malformed_archive(err: std::io::Error) -> PannierError {
    PannierError::MalformedDocument {
        reason: format!("payload is not a valid archive: {}", err),
    }
}

/// Wrap base64 text at a fixed column so documents stay diff-friendly
fn wrap_text(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_WRAP + 1);
    let mut rest = encoded;
    while rest.len() > BASE64_WRAP {
        let (line, tail) = rest.split_at(BASE64_WRAP);
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, contents: &[u8]) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// gzip + base64 a hand-built tar, mirroring the tail of `pack`
    fn encode_raw_tar(tar_bytes: &[u8]) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(tar_bytes).unwrap();
        let compressed = encoder.finish().unwrap();
        wrap_text(&general_purpose::STANDARD.encode(&compressed))
    }

    /// A payload whose single member carries an arbitrary (possibly hostile)
    /// name. `Builder` refuses to write such names, so the header name field
    /// is patched directly.
    fn payload_with_member_name(name: &str) -> String {
        let contents = b"owned";
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.as_mut_bytes()[..name.len()].copy_from_slice(name.as_bytes());
        header.set_cksum();

        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, contents.as_slice()).unwrap();
        encode_raw_tar(&builder.into_inner().unwrap())
    }

    #[test]
    fn test_pack_unpack_identity() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "PRD.md", b"# Test\n");
        write_file(src.path(), "docs/PLAN.md", b"phase one\n");
        // control characters and non-UTF8 bytes survive the text encoding
        write_file(src.path(), "blob.bin", &[0u8, 7, 159, 255, 13, 10, 128]);

        let payload = pack(
            src.path(),
            &[
                "PRD.md".to_string(),
                "docs/PLAN.md".to_string(),
                "blob.bin".to_string(),
            ],
        )
        .unwrap();

        let dest = TempDir::new().unwrap();
        let mut written = unpack(&payload, dest.path(), false).unwrap();
        written.sort();
        assert_eq!(written, vec!["PRD.md", "blob.bin", "docs/PLAN.md"]);

        assert_eq!(fs::read(dest.path().join("PRD.md")).unwrap(), b"# Test\n");
        assert_eq!(
            fs::read(dest.path().join("docs/PLAN.md")).unwrap(),
            b"phase one\n"
        );
        assert_eq!(
            fs::read(dest.path().join("blob.bin")).unwrap(),
            vec![0u8, 7, 159, 255, 13, 10, 128]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_pack_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().unwrap();
        write_file(src.path(), "run.sh", b"#!/bin/sh\n");
        fs::set_permissions(
            src.path().join("run.sh"),
            fs::Permissions::from_mode(0o755),
        )
        .unwrap();

        let payload = pack(src.path(), &["run.sh".to_string()]).unwrap();
        let dest = TempDir::new().unwrap();
        unpack(&payload, dest.path(), false).unwrap();

        let mode = fs::metadata(dest.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_pack_is_order_independent() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "a.md", b"a");
        write_file(src.path(), "b.md", b"b");

        let forward = pack(src.path(), &["a.md".to_string(), "b.md".to_string()]).unwrap();
        let reverse = pack(src.path(), &["b.md".to_string(), "a.md".to_string()]).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_payload_lines_stay_wrapped() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "big.txt", &vec![b'x'; 16 * 1024]);

        let payload = pack(src.path(), &["big.txt".to_string()]).unwrap();
        assert!(payload.lines().count() > 1);
        assert!(payload.lines().all(|l| l.len() <= BASE64_WRAP));
    }

    #[test]
    fn test_pack_empty_set_is_refused() {
        let src = TempDir::new().unwrap();
        let err = pack(src.path(), &[]).unwrap_err();
        assert!(matches!(err, PannierError::InvalidSelection { .. }));
    }

    #[test]
    fn test_members_lists_without_writing() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "PRD.md", b"# Test\n");
        write_file(src.path(), "docs/PLAN.md", b"plan");

        let payload = pack(
            src.path(),
            &["docs/PLAN.md".to_string(), "PRD.md".to_string()],
        )
        .unwrap();

        let listed = members(&payload).unwrap();
        assert_eq!(
            listed,
            vec![
                ArchiveMember {
                    path: "PRD.md".to_string(),
                    size: 7
                },
                ArchiveMember {
                    path: "docs/PLAN.md".to_string(),
                    size: 4
                },
            ]
        );
    }

    #[test]
    fn test_unpack_conflict_is_atomic() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "a.md", b"new a");
        write_file(src.path(), "b.md", b"new b");
        let payload = pack(src.path(), &["a.md".to_string(), "b.md".to_string()]).unwrap();

        let dest = TempDir::new().unwrap();
        write_file(dest.path(), "b.md", b"old b");

        let err = unpack(&payload, dest.path(), false).unwrap_err();
        match err {
            PannierError::DestinationConflict { path } => {
                assert!(path.ends_with("b.md"));
            }
            other => panic!("expected DestinationConflict, got {other:?}"),
        }
        // nothing was written, not even the non-colliding member
        assert!(!dest.path().join("a.md").exists());
        assert_eq!(fs::read(dest.path().join("b.md")).unwrap(), b"old b");
    }

    #[test]
    fn test_unpack_file_ancestor_conflict_is_atomic() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "PRD.md", b"prd");
        write_file(src.path(), "docs/PLAN.md", b"plan");
        let payload = pack(
            src.path(),
            &["PRD.md".to_string(), "docs/PLAN.md".to_string()],
        )
        .unwrap();

        // a plain file sits where a member needs a directory
        let dest = TempDir::new().unwrap();
        write_file(dest.path(), "docs", b"not a directory");

        for overwrite in [false, true] {
            let err = unpack(&payload, dest.path(), overwrite).unwrap_err();
            match err {
                PannierError::DestinationConflict { path } => assert!(path.ends_with("docs")),
                other => panic!("expected DestinationConflict, got {other:?}"),
            }
        }
        // the member sorting ahead of the colliding one was not written
        assert!(!dest.path().join("PRD.md").exists());
        assert_eq!(
            fs::read(dest.path().join("docs")).unwrap(),
            b"not a directory"
        );
    }

    #[test]
    fn test_unpack_overwrite_refuses_directory_target() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "a.md", b"file");
        let payload = pack(src.path(), &["a.md".to_string()]).unwrap();

        let dest = TempDir::new().unwrap();
        fs::create_dir_all(dest.path().join("a.md")).unwrap();

        let err = unpack(&payload, dest.path(), true).unwrap_err();
        assert!(matches!(err, PannierError::DestinationConflict { .. }));
    }

    #[test]
    fn test_unpack_overwrite_replaces() {
        let src = TempDir::new().unwrap();
        write_file(src.path(), "a.md", b"new");
        let payload = pack(src.path(), &["a.md".to_string()]).unwrap();

        let dest = TempDir::new().unwrap();
        write_file(dest.path(), "a.md", b"old");

        unpack(&payload, dest.path(), true).unwrap();
        assert_eq!(fs::read(dest.path().join("a.md")).unwrap(), b"new");
    }

    #[test]
    fn test_traversal_member_is_rejected() {
        let payload = payload_with_member_name("../evil.txt");
        let err = members(&payload).unwrap_err();
        assert!(matches!(err, PannierError::UnsafeArchiveMember { .. }));

        let dest = TempDir::new().unwrap();
        let err = unpack(&payload, dest.path(), true).unwrap_err();
        assert!(matches!(err, PannierError::UnsafeArchiveMember { .. }));
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_absolute_member_is_rejected() {
        let payload = payload_with_member_name("/etc/owned");
        let err = members(&payload).unwrap_err();
        match err {
            PannierError::UnsafeArchiveMember { reason, .. } => {
                assert_eq!(reason, "absolute path");
            }
            other => panic!("expected UnsafeArchiveMember, got {other:?}"),
        }
    }

    #[test]
    fn test_git_dir_member_is_rejected() {
        let payload = payload_with_member_name(".git/hooks/post-checkout");
        let err = members(&payload).unwrap_err();
        assert!(matches!(err, PannierError::UnsafeArchiveMember { .. }));
    }

    #[test]
    fn test_link_member_is_rejected() {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_path("innocent.md").unwrap();
        header.set_link_name("/etc/passwd").unwrap();
        header.set_size(0);
        header.set_cksum();

        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, std::io::empty()).unwrap();
        let payload = encode_raw_tar(&builder.into_inner().unwrap());

        let err = members(&payload).unwrap_err();
        assert!(matches!(err, PannierError::UnsafeArchiveMember { .. }));
    }

    #[test]
    fn test_garbage_payload_is_malformed() {
        let err = unpack("not base64 at all!", TempDir::new().unwrap().path(), true).unwrap_err();
        assert!(matches!(err, PannierError::MalformedDocument { .. }));

        // valid base64, not gzip
        let text = general_purpose::STANDARD.encode(b"plain bytes");
        let err = members(&text).unwrap_err();
        assert!(matches!(err, PannierError::MalformedDocument { .. }));
    }
}
