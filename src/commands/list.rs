//! `pannier list` command - list commits carrying note documents

use crate::cli::{Cli, OutputFormat};
use crate::commands::short_id;
use pannier_core::error::Result;
use pannier_core::git::GitNotes;
use pannier_core::store::NoteStore;

/// Execute the list command
pub fn execute(cli: &Cli, notes: &GitNotes, namespace: &str) -> Result<()> {
    let mut commits = notes.list(namespace)?;
    commits.sort();

    match cli.format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = commits
                .iter()
                .map(|commit| {
                    serde_json::json!({
                        "commit": commit,
                        "subject": notes.commit_subject(commit).ok(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "namespace": namespace,
                "documents": entries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if commits.is_empty() {
                if !cli.quiet {
                    println!("No documents in namespace {}", namespace);
                }
                return Ok(());
            }
            for commit in &commits {
                let subject = notes
                    .commit_subject(commit)
                    .unwrap_or_else(|_| "<unreachable commit>".to_string());
                println!("{}  {}", short_id(commit), subject);
            }
        }
    }
    Ok(())
}
