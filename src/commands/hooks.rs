//! Git hooks command implementation
//!
//! Manages the post-rewrite hook that keeps note documents attached when
//! commits are amended or rebased. The installed hook is a thin shim that
//! delegates to `pannier hooks run post-rewrite`.

use std::fs;
use std::io;
use std::path::Path;

use crate::cli::{Cli, OutputFormat};
use pannier_core::error::{PannierError, Result};
use pannier_core::git::GitNotes;
use pannier_core::rewrite;

/// The one hook pannier manages
const HOOK_NAME: &str = "post-rewrite";

/// Pannier marker in hooks for identification
const PANNIER_HOOK_MARKER: &str = "# PANNIER HOOK - Managed by pannier hooks command";

/// Check if the hook is installed and managed by pannier
fn is_pannier_hook_installed(hooks_dir: &Path) -> bool {
    let hook_path = hooks_dir.join(HOOK_NAME);
    if !hook_path.exists() {
        return false;
    }

    if let Ok(content) = fs::read_to_string(&hook_path) {
        return content.contains(PANNIER_HOOK_MARKER);
    }

    false
}

/// Generate the hook script content
fn generate_hook_script() -> String {
    format!(
        r#"#!/bin/sh
{marker}
# Hook: {hook}
#
# This shim delegates to 'pannier hooks run {hook}' which carries the
# actual hook logic. Edit that command, not this file.

# Ensure pannier is available
if ! command -v pannier >/dev/null 2>&1; then
    echo "Warning: pannier command not found in PATH, skipping {hook} hook" >&2
    exit 0
fi

# Git feeds rewrite pairs on stdin; exec preserves it
exec pannier hooks run {hook} "$@"
"#,
        marker = PANNIER_HOOK_MARKER,
        hook = HOOK_NAME
    )
}

/// Install the post-rewrite hook
pub fn install(cli: &Cli, notes: &GitNotes, force: bool) -> Result<()> {
    let hooks_dir = notes.hooks_dir()?;
    let hook_path = hooks_dir.join(HOOK_NAME);

    let mut skipped = false;
    if hook_path.exists() && !force {
        if is_pannier_hook_installed(&hooks_dir) {
            skipped = true;
        } else {
            return Err(PannierError::Other(format!(
                "Hook {} already exists and is not managed by pannier. Use --force to overwrite.",
                HOOK_NAME
            )));
        }
    }

    if !skipped {
        fs::create_dir_all(&hooks_dir)?;
        fs::write(&hook_path, generate_hook_script())?;

        // Make executable (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&hook_path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&hook_path, perms)?;
        }
    }

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "hook": HOOK_NAME,
                "installed": !skipped,
                "skipped": skipped,
                "hooks_dir": hooks_dir.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                if skipped {
                    println!("⊘ Hook {} already installed", HOOK_NAME);
                } else {
                    println!("✓ Installed {} hook", HOOK_NAME);
                }
                println!("  Location: {}", hook_path.display());
            }
        }
    }
    Ok(())
}

/// Run a hook with git's stdin
pub fn run(
    cli: &Cli,
    notes: &GitNotes,
    namespace: &str,
    hook: &str,
    args: &[String],
) -> Result<()> {
    if hook != HOOK_NAME {
        return Err(PannierError::UsageError(format!(
            "Unknown hook: '{}'. Available hooks: {}",
            hook, HOOK_NAME
        )));
    }

    tracing::debug!(hook = %hook, args = ?args, "running hook");
    let stdin = io::stdin();
    let summary = rewrite::process_rewrites(notes, namespace, stdin.lock())?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "hook": HOOK_NAME,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            // quiet in the common case so rebases stay clean
            if summary.copied > 0 || summary.recorded > 0 {
                eprintln!(
                    "pannier: carried {} document{} across rewrite",
                    summary.copied.max(summary.recorded),
                    if summary.copied.max(summary.recorded) == 1 {
                        ""
                    } else {
                        "s"
                    }
                );
            }
        }
    }
    Ok(())
}

/// Uninstall the post-rewrite hook
pub fn uninstall(cli: &Cli, notes: &GitNotes) -> Result<()> {
    let hooks_dir = notes.hooks_dir()?;
    let hook_path = hooks_dir.join(HOOK_NAME);

    let removed = if is_pannier_hook_installed(&hooks_dir) {
        fs::remove_file(&hook_path)?;
        true
    } else {
        false
    };

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "hook": HOOK_NAME,
                "removed": removed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                if removed {
                    println!("✓ Uninstalled {} hook", HOOK_NAME);
                } else {
                    println!(
                        "⊘ Skipped: {} hook not installed or not managed by pannier",
                        HOOK_NAME
                    );
                }
            }
        }
    }
    Ok(())
}

/// Check hook status
pub fn status(cli: &Cli, notes: &GitNotes) -> Result<()> {
    let hooks_dir = notes.hooks_dir()?;
    let installed = is_pannier_hook_installed(&hooks_dir);

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "hook": HOOK_NAME,
                "installed": installed,
                "hooks_dir": hooks_dir.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            println!("Repository: {}", notes.repo_root().display());
            println!("Hooks directory: {}", hooks_dir.display());
            let state = if installed {
                "✓ installed"
            } else {
                "✗ not installed"
            };
            println!("  {} - {}", HOOK_NAME, state);
            if !installed {
                println!();
                println!("Run `pannier hooks install` to keep documents attached across rewrites.");
            }
        }
    }
    Ok(())
}
