//! Pannier Core Library
//!
//! Core domain logic for attaching bundles of working-tree files to git
//! commits as notes. Notes are whole-document values: every save reads the
//! existing document, merges, and writes it back, and concurrent writers to
//! the same commit resolve last-writer-wins at the notes ref.

pub mod archive;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod git;
pub mod logging;
pub mod ops;
pub mod rewrite;
pub mod select;
pub mod store;
