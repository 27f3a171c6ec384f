//! Error types and exit codes for pannier
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (I/O, git plumbing, serialization)
//! - 2: Usage error (bad flags/args, bad path selection)
//! - 3: Data/store error (missing note, schema mismatch, unsafe payload)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes reported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/store error - missing note, bad document (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during pannier operations
#[derive(Error, Debug)]
pub enum PannierError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("{0}")]
    UsageError(String),

    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    #[error("no files matched required pattern: {pattern}")]
    MissingRequiredPath { pattern: String },

    // Data/store errors (exit code 3)
    #[error("no note found for commit {commit} in namespace {namespace}")]
    NotFound { commit: String, namespace: String },

    #[error("unsupported {field}: {found} (supported: {supported})")]
    SchemaMismatch {
        field: &'static str,
        found: String,
        supported: String,
    },

    #[error("malformed note document: {reason}")]
    MalformedDocument { reason: String },

    #[error("refusing to overwrite existing file: {path}")]
    DestinationConflict { path: PathBuf },

    #[error("unsafe archive member {member}: {reason}")]
    UnsafeArchiveMember { member: String, reason: String },

    #[error("unknown revision: {rev}")]
    UnknownRevision { rev: String },

    #[error("not a git repository (searched from {searched})")]
    NotARepository { searched: PathBuf },

    // Generic failures (exit code 1)
    #[error("git {operation} failed: {detail}")]
    Git { operation: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl PannierError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            // Usage errors
            PannierError::UnknownFormat(_)
            | PannierError::UsageError(_)
            | PannierError::InvalidSelection { .. }
            | PannierError::MissingRequiredPath { .. } => ExitCode::Usage,

            // Data/store errors
            PannierError::NotFound { .. }
            | PannierError::SchemaMismatch { .. }
            | PannierError::MalformedDocument { .. }
            | PannierError::DestinationConflict { .. }
            | PannierError::UnsafeArchiveMember { .. }
            | PannierError::UnknownRevision { .. }
            | PannierError::NotARepository { .. } => ExitCode::Data,

            // Generic failures
            PannierError::Git { .. }
            | PannierError::Io(_)
            | PannierError::Yaml(_)
            | PannierError::Json(_)
            | PannierError::Other(_) => ExitCode::Failure,
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            PannierError::UnknownFormat(_) => "unknown_format",
            PannierError::UsageError(_) => "usage_error",
            PannierError::InvalidSelection { .. } => "invalid_selection",
            PannierError::MissingRequiredPath { .. } => "missing_required_path",
            PannierError::NotFound { .. } => "not_found",
            PannierError::SchemaMismatch { .. } => "schema_mismatch",
            PannierError::MalformedDocument { .. } => "malformed_document",
            PannierError::DestinationConflict { .. } => "destination_conflict",
            PannierError::UnsafeArchiveMember { .. } => "unsafe_archive_member",
            PannierError::UnknownRevision { .. } => "unknown_revision",
            PannierError::NotARepository { .. } => "not_a_repository",
            PannierError::Git { .. } => "git_error",
            PannierError::Io(_) => "io_error",
            PannierError::Yaml(_) => "yaml_error",
            PannierError::Json(_) => "json_error",
            PannierError::Other(_) => "other",
        }
    }
}

/// Result type alias for pannier operations
pub type Result<T> = std::result::Result<T, PannierError>;
