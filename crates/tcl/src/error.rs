//! Error types for osvvm-tcl

use osvvm_model::ModelError;
use thiserror::Error;

/// Errors surfaced by the `.pro` processor.
#[derive(Debug, Error)]
pub enum TclError {
    /// Injecting the baseline `::osvvm::*` variables failed. Fatal at
    /// startup.
    #[error("failed to load interpreter defaults: {0}")]
    Configuration(String),

    /// The interpreter reported a fault while evaluating a script. When a
    /// handler parked the original error in the context side channel, it is
    /// carried here as the cause; the interpreter's own message may be an
    /// empty or flattened rendition of it.
    #[error("script evaluation failed: {message}")]
    ScriptEvaluation {
        message: String,
        #[source]
        cause: Option<ModelError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TclError {
    /// The model error recovered from the context side channel, if any.
    pub fn cause(&self) -> Option<&ModelError> {
        match self {
            Self::ScriptEvaluation { cause, .. } => cause.as_ref(),
            _ => None,
        }
    }
}
