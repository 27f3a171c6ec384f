//! `pannier save` command - archive files onto a commit's note document

use crate::cli::{Cli, OutputFormat};
use crate::commands::short_id;
use pannier_core::error::Result;
use pannier_core::git::GitNotes;
use pannier_core::ops;

/// Execute the save command
pub fn execute(
    cli: &Cli,
    notes: &GitNotes,
    namespace: &str,
    patterns: &[String],
    rev: &str,
    message: Option<String>,
    ignore_missing: bool,
) -> Result<()> {
    let commit = notes.resolve_commit(rev)?;
    let outcome = ops::save(
        notes,
        notes.repo_root(),
        namespace,
        &commit,
        patterns,
        !ignore_missing,
        message,
    )?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "commit": commit,
                "namespace": namespace,
                "created": outcome.created,
                "selected": outcome.selected,
                "paths": outcome.document.paths,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                let verb = if outcome.created { "Created" } else { "Updated" };
                let total = outcome.document.paths.len();
                println!(
                    "{} document on {} ({} file{})",
                    verb,
                    short_id(&commit),
                    total,
                    if total == 1 { "" } else { "s" }
                );
                for path in &outcome.document.paths {
                    let mark = if outcome.selected.contains(path) {
                        "+"
                    } else {
                        "="
                    };
                    println!("  {} {}", mark, path);
                }
            }
        }
    }
    Ok(())
}
