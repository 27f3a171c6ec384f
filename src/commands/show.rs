//! `pannier show` command - display the document attached to a commit

use chrono::SecondsFormat;

use crate::cli::{Cli, OutputFormat};
use crate::commands::short_id;
use pannier_core::archive;
use pannier_core::error::Result;
use pannier_core::git::GitNotes;
use pannier_core::ops;

/// Execute the show command
pub fn execute(cli: &Cli, notes: &GitNotes, namespace: &str, rev: &str) -> Result<()> {
    let commit = notes.resolve_commit(rev)?;
    let document = ops::load(notes, namespace, &commit)?;
    let members = archive::members(&document.payload)?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "commit": commit,
                "namespace": namespace,
                "document": document,
                "members": members,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            println!("commit:   {}", commit);
            println!(
                "created:  {}",
                document.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
            if let Some(updated) = document.updated_at {
                println!(
                    "updated:  {}",
                    updated.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
            }
            if let Some(message) = &document.message {
                println!("message:  {}", message);
            }
            if !document.commit_history.is_empty() {
                let history: Vec<&str> = document
                    .commit_history
                    .iter()
                    .map(|id| short_id(id))
                    .collect();
                println!("history:  {}", history.join(" -> "));
            }
            println!("files ({}):", members.len());
            for member in &members {
                println!("  {} ({} bytes)", member.path, member.size);
            }
        }
    }
    Ok(())
}
