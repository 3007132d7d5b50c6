//! Error types for osvvm-model

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the project model and the [`crate::Context`] cursor.
///
/// The enum is `Clone` because a handler may park the original error in the
/// Context side channel before it crosses the Tcl interpreter boundary as a
/// plain string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unsupported VHDL version year: {0}")]
    UnsupportedVhdlVersion(u16),

    #[error("build '{0}' is already open; builds do not nest")]
    BuildAlreadyOpen(String),

    #[error("no build is open")]
    NoOpenBuild,

    #[error("build '{0}' is already registered in this project")]
    DuplicateBuild(String),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read script '{}': {message}", .path.display())]
    ScriptRead { path: PathBuf, message: String },
}
