//! CLI argument parsing for pannier
//!
//! Uses clap for argument parsing.
//! Supports global flags: --root, --namespace, --format, --quiet, --verbose

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use pannier_core::format::OutputFormat;

/// Pannier - attach bundles of working files to git commits
#[derive(Parser, Debug)]
#[command(name = "pannier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Repository to operate on (discovered from the current directory if omitted)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Notes namespace holding the documents
    #[arg(long, short = 'n', global = true, env = "PANNIER_NAMESPACE")]
    pub namespace: Option<String>,

    /// Output format (human or json)
    // OutputFormat is foreign (pannier-core), so clap parses it via FromStr
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Verbose diagnostics
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Archive files onto a commit's note document
    Save {
        /// Files, directories, or globs to archive
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,

        /// Commit to attach the document to (any revision spelling)
        #[arg(long, short, default_value = "HEAD")]
        commit: String,

        /// One-line annotation stored in the document header
        #[arg(long, short)]
        message: Option<String>,

        /// Skip patterns that match nothing instead of failing
        #[arg(long)]
        ignore_missing: bool,
    },

    /// Extract a commit's archived files into a directory
    Restore {
        /// Commit carrying the document
        #[arg(default_value = "HEAD")]
        commit: String,

        /// Destination directory (defaults to the repository root)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Replace files that already exist at the destination
        #[arg(long, short)]
        force: bool,

        /// List the archive contents without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the document metadata attached to a commit
    Show {
        /// Commit carrying the document
        #[arg(default_value = "HEAD")]
        commit: String,
    },

    /// List commits carrying note documents
    List,

    /// Delete the document attached to a commit
    Remove {
        /// Commit carrying the document
        #[arg(default_value = "HEAD")]
        commit: String,
    },

    /// Push the notes ref to a remote
    Push {
        /// Remote to push to
        #[arg(long, env = "PANNIER_REMOTE")]
        remote: Option<String>,
    },

    /// Fetch the notes ref from a remote
    Fetch {
        /// Remote to fetch from
        #[arg(long, env = "PANNIER_REMOTE")]
        remote: Option<String>,
    },

    /// Manage the post-rewrite hook that keeps documents attached across
    /// amends and rebases
    Hooks {
        #[command(subcommand)]
        command: HookCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum HookCommands {
    /// Install the post-rewrite hook into the repository
    Install {
        /// Replace an existing hook that pannier does not manage
        #[arg(long)]
        force: bool,
    },

    /// Run a hook with git's arguments and stdin (invoked by git)
    Run {
        /// Hook name
        #[arg(value_name = "HOOK")]
        hook: String,

        /// Arguments passed through by git
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Remove the pannier-managed hook
    Uninstall,

    /// Report whether the hook is installed
    Status,
}
