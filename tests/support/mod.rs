use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

/// Get a Command for pannier
pub fn pannier() -> Command {
    cargo_bin_cmd!("pannier")
}

/// Run git in `dir` and assert it succeeded
pub fn git(dir: &Path, args: &[&str]) -> Output {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

/// Initialize a repository with a deterministic identity
pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q", "-b", "main"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Write a file under `dir`, creating parent directories
pub fn write_file(dir: &Path, rel: &str, contents: &[u8]) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Stage everything and commit, returning the new commit id
pub fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "--allow-empty", "-m", message]);
    rev_parse(dir, "HEAD")
}

/// Resolve a revision to a full object id
pub fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = git(dir, &["rev-parse", rev]);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Raw note text exactly as git stores it
#[allow(dead_code)]
pub fn note_text(dir: &Path, namespace: &str, commit: &str) -> String {
    let output = git(dir, &["notes", "--ref", namespace, "show", commit]);
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Parse the YAML header of a stored note document
#[allow(dead_code)]
pub fn note_header(dir: &Path, namespace: &str, commit: &str) -> serde_yaml::Value {
    let text = note_text(dir, namespace, commit);
    let header = text
        .split("\n---\n")
        .next()
        .expect("note document has no header terminator");
    serde_yaml::from_str(header).expect("note header is not valid YAML")
}

/// A repository with one commit and an uncommitted PRD.md, ready to save
#[allow(dead_code)]
pub fn repo_with_doc() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    write_file(dir.path(), "src/lib.rs", b"pub fn answer() -> u32 { 42 }\n");
    let commit = commit_all(dir.path(), "initial commit");
    write_file(dir.path(), "PRD.md", b"# Product requirements\n");
    (dir, commit)
}
