//! `pannier remove` command - delete the document attached to a commit

use crate::cli::{Cli, OutputFormat};
use crate::commands::short_id;
use pannier_core::error::Result;
use pannier_core::git::GitNotes;
use pannier_core::store::NoteStore;

/// Execute the remove command
pub fn execute(cli: &Cli, notes: &GitNotes, namespace: &str, rev: &str) -> Result<()> {
    let commit = notes.resolve_commit(rev)?;
    notes.remove(namespace, &commit)?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "commit": commit,
                "namespace": namespace,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                println!("Removed document from {}", short_id(&commit));
            }
        }
    }
    Ok(())
}
