//! `pannier restore` command - extract archived files into a directory

use std::path::Path;

use crate::cli::{Cli, OutputFormat};
use crate::commands::short_id;
use pannier_core::error::Result;
use pannier_core::git::GitNotes;
use pannier_core::ops;

/// Execute the restore command
pub fn execute(
    cli: &Cli,
    notes: &GitNotes,
    namespace: &str,
    rev: &str,
    output: Option<&Path>,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let commit = notes.resolve_commit(rev)?;
    let dest = match output {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => notes.repo_root().join(path),
        None => notes.repo_root().to_path_buf(),
    };

    let outcome = ops::restore(notes, namespace, &commit, &dest, force, dry_run)?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "commit": commit,
                "namespace": namespace,
                "destination": dest.display().to_string(),
                "dry_run": dry_run,
                "members": outcome.members,
                "written": outcome.written,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if dry_run {
                println!(
                    "Document on {} holds {} file{}:",
                    short_id(&commit),
                    outcome.members.len(),
                    if outcome.members.len() == 1 { "" } else { "s" }
                );
                for member in &outcome.members {
                    println!("  {} ({} bytes)", member.path, member.size);
                }
            } else if !cli.quiet {
                println!(
                    "Restored {} file{} from {} into {}",
                    outcome.written.len(),
                    if outcome.written.len() == 1 { "" } else { "s" },
                    short_id(&commit),
                    dest.display()
                );
                for path in &outcome.written {
                    println!("  {}", path);
                }
            }
        }
    }
    Ok(())
}
