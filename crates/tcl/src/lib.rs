//! osvvm-tcl: the Tcl side of the OSVVM `.pro` processor
//!
//! This crate bridges an embedded Tcl interpreter (molt) and the project
//! model:
//! - `procedures`: one handler per `.pro` procedure (`build`, `include`,
//!   `library`, `analyze`, `simulate`, `TestSuite`, `TestName`, `RunTest`,
//!   version getters/setters, filesystem probes), registered under their
//!   canonical names
//! - `options`: the recognized-options structure produced by the
//!   argument-producing procedures (`generic`, `BuildName`)
//! - `ProFileProcessor`: interpreter construction, baseline `::osvvm::*`
//!   variables, script evaluation, and translation of interpreter faults
//!   into [`TclError`]

mod error;
mod options;
mod procedures;
mod processor;

pub use error::TclError;
pub use options::CommandOptions;
pub use processor::{OsvvmVariables, ProFileProcessor};
