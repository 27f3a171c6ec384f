//! Git plumbing
//!
//! Everything pannier asks of git goes through the system `git` binary:
//! notes storage under `refs/notes/<namespace>`, revision resolution,
//! repository discovery, config lookup, and notes-ref sync with a remote.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{PannierError, Result};
use crate::store::NoteStore;

/// Check if git is available on the system
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Note store and repository handle backed by `git notes`
#[derive(Debug, Clone)]
pub struct GitNotes {
    repo_root: PathBuf,
}

impl GitNotes {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Locate the repository containing `start` and bind to its toplevel
    pub fn discover(start: &Path) -> Result<Self> {
        let output = Command::new("git")
            .arg("-C")
            .arg(start)
            .args(["rev-parse", "--show-toplevel"])
            .output()?;
        if !output.status.success() {
            return Err(PannierError::NotARepository {
                searched: start.to_path_buf(),
            });
        }
        let toplevel = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self::new(toplevel))
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_root);
        cmd
    }

    fn run(&self, operation: &str, args: &[&str]) -> Result<String> {
        let output = self.git().args(args).output()?;
        if !output.status.success() {
            return Err(PannierError::Git {
                operation: operation.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Resolve any revision spelling to a full commit id
    pub fn resolve_commit(&self, rev: &str) -> Result<String> {
        let spec = format!("{}^{{commit}}", rev);
        let output = self
            .git()
            .args(["rev-parse", "--verify", "--quiet", "--end-of-options", &spec])
            .output()?;
        if !output.status.success() {
            return Err(PannierError::UnknownRevision {
                rev: rev.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// First line of a commit's message, for listings
    pub fn commit_subject(&self, commit: &str) -> Result<String> {
        let stdout = self.run("log", &["log", "-1", "--format=%s", commit])?;
        Ok(stdout.trim().to_string())
    }

    /// Where git runs hooks for this repository
    pub fn hooks_dir(&self) -> Result<PathBuf> {
        let stdout = self.run("rev-parse", &["rev-parse", "--git-path", "hooks"])?;
        let path = PathBuf::from(stdout.trim());
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.repo_root.join(path))
        }
    }

    /// Read a single config value, `None` when unset
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let output = self.git().args(["config", "--get", key]).output()?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    /// Push `refs/notes/<namespace>` to `remote`
    pub fn push_notes(&self, remote: &str, namespace: &str) -> Result<()> {
        let refspec = format!("{0}:{0}", note_ref(namespace));
        self.run("push", &["push", remote, &refspec])?;
        Ok(())
    }

    /// Fetch `refs/notes/<namespace>` from `remote`.
    ///
    /// The refspec is not forced, so a diverged remote ref surfaces as a git
    /// error instead of silently dropping local documents.
    pub fn fetch_notes(&self, remote: &str, namespace: &str) -> Result<()> {
        let refspec = format!("{0}:{0}", note_ref(namespace));
        self.run("fetch", &["fetch", remote, &refspec])?;
        Ok(())
    }
}

impl NoteStore for GitNotes {
    fn get(&self, namespace: &str, commit: &str) -> Result<Option<String>> {
        let output = self
            .git()
            .args(["notes", "--ref", namespace, "show", commit])
            .output()?;
        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no note found") {
            return Ok(None);
        }
        Err(PannierError::Git {
            operation: "notes show".to_string(),
            detail: stderr.trim().to_string(),
        })
    }

    fn put(&self, namespace: &str, commit: &str, text: &str, overwrite: bool) -> Result<()> {
        let mut cmd = self.git();
        cmd.args(["notes", "--ref", namespace, "add"]);
        if overwrite {
            cmd.arg("-f");
        }
        cmd.args(["-F", "-", commit]);

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(PannierError::Git {
                operation: "notes add".to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn copy(&self, namespace: &str, from: &str, to: &str) -> Result<()> {
        self.run("notes copy", &["notes", "--ref", namespace, "copy", from, to])?;
        Ok(())
    }

    fn remove(&self, namespace: &str, commit: &str) -> Result<()> {
        let output = self
            .git()
            .args(["notes", "--ref", namespace, "remove", commit])
            .output()?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("has no note") {
            return Err(PannierError::NotFound {
                commit: commit.to_string(),
                namespace: namespace.to_string(),
            });
        }
        Err(PannierError::Git {
            operation: "notes remove".to_string(),
            detail: stderr.trim().to_string(),
        })
    }

    fn list(&self, namespace: &str) -> Result<Vec<String>> {
        let output = self
            .git()
            .args(["notes", "--ref", namespace, "list"])
            .output()?;
        if !output.status.success() {
            // an absent notes ref means an empty listing
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect())
    }
}

fn note_ref(namespace: &str) -> String {
    format!("refs/notes/{}", namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_ref_is_fully_qualified() {
        assert_eq!(note_ref("pannier"), "refs/notes/pannier");
        assert_eq!(note_ref("team/docs"), "refs/notes/team/docs");
    }

    #[test]
    fn test_discover_outside_a_repository() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = GitNotes::discover(tmp.path()).unwrap_err();
        assert!(matches!(err, PannierError::NotARepository { .. }));
    }
}
