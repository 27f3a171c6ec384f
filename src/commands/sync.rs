//! `pannier push` and `pannier fetch` commands - sync the notes ref
//!
//! Documents live on a single notes ref, so syncing is one refspec in
//! either direction. Divergent histories are surfaced as git errors rather
//! than merged.

use crate::cli::{Cli, OutputFormat};
use pannier_core::config;
use pannier_core::error::Result;
use pannier_core::git::GitNotes;

/// Execute the push command
pub fn push(cli: &Cli, notes: &GitNotes, namespace: &str, remote: Option<&str>) -> Result<()> {
    let remote = config::resolve_remote(notes, remote)?;
    notes.push_notes(&remote, namespace)?;
    report(cli, "push", namespace, &remote)
}

/// Execute the fetch command
pub fn fetch(cli: &Cli, notes: &GitNotes, namespace: &str, remote: Option<&str>) -> Result<()> {
    let remote = config::resolve_remote(notes, remote)?;
    notes.fetch_notes(&remote, namespace)?;
    report(cli, "fetch", namespace, &remote)
}

fn report(cli: &Cli, action: &str, namespace: &str, remote: &str) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "action": action,
                "namespace": namespace,
                "remote": remote,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                let direction = if action == "push" { "to" } else { "from" };
                println!(
                    "Synced refs/notes/{} {} {}",
                    namespace, direction, remote
                );
            }
        }
    }
    Ok(())
}
