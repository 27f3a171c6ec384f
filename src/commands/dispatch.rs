//! Command dispatch logic for pannier
use std::env;
use std::path::PathBuf;
use std::time::Instant;

use crate::cli::{Cli, Commands, HookCommands};
use crate::commands;
use pannier_core::config;
use pannier_core::error::{PannierError, Result};
use pannier_core::git::{self, GitNotes};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    // Determine the directory to discover the repository from
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let notes = GitNotes::discover(&root).map_err(|e| {
        if git::is_git_available() {
            e
        } else {
            PannierError::Other("git executable not found in PATH".to_string())
        }
    })?;
    let namespace = config::resolve_namespace(&notes, cli.namespace.as_deref())?;

    if cli.verbose {
        eprintln!("discover_repository: {:?}", start.elapsed());
    }
    tracing::debug!(
        root = %notes.repo_root().display(),
        namespace = %namespace,
        "resolved repository"
    );

    match &cli.command {
        Commands::Save {
            paths,
            commit,
            message,
            ignore_missing,
        } => commands::save::execute(
            cli,
            &notes,
            &namespace,
            paths,
            commit,
            message.clone(),
            *ignore_missing,
        ),

        Commands::Restore {
            commit,
            output,
            force,
            dry_run,
        } => commands::restore::execute(
            cli,
            &notes,
            &namespace,
            commit,
            output.as_deref(),
            *force,
            *dry_run,
        ),

        Commands::Show { commit } => commands::show::execute(cli, &notes, &namespace, commit),

        Commands::List => commands::list::execute(cli, &notes, &namespace),

        Commands::Remove { commit } => commands::remove::execute(cli, &notes, &namespace, commit),

        Commands::Push { remote } => {
            commands::sync::push(cli, &notes, &namespace, remote.as_deref())
        }

        Commands::Fetch { remote } => {
            commands::sync::fetch(cli, &notes, &namespace, remote.as_deref())
        }

        Commands::Hooks { command } => match command {
            HookCommands::Install { force } => {
                commands::hooks::install(cli, &notes, *force)
            }
            HookCommands::Run { hook, args } => {
                commands::hooks::run(cli, &notes, &namespace, hook, args)
            }
            HookCommands::Uninstall => commands::hooks::uninstall(cli, &notes),
            HookCommands::Status => commands::hooks::status(cli, &notes),
        },
    }
}
