//! The `.pro` file processor
//!
//! Owns one molt interpreter bound to one [`Context`]. Construction loads
//! the fixed `::osvvm::*` defaults, silences `puts`, and registers the
//! procedure handlers; afterwards the processor is a thin evaluation
//! surface that translates interpreter faults into [`TclError`].

use std::fs;
use std::path::Path;

use molt::types::{ContextID, Exception};
use molt::{Interp, Value};
use osvvm_model::{Context, ProjectRef};
use tracing::{debug, info};

use crate::error::TclError;
use crate::procedures;

/// Baseline variables injected into the interpreter's global namespace
/// before any script runs. Scripts read these for tool detection; the
/// model never does.
#[derive(Debug, Clone)]
pub struct OsvvmVariables {
    pub tool_name: String,
}

impl Default for OsvvmVariables {
    fn default() -> Self {
        Self {
            tool_name: concat!("osvvm-pro ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Processor for OSVVM `.pro` project description scripts.
pub struct ProFileProcessor {
    interp: Interp,
    context_id: ContextID,
}

impl ProFileProcessor {
    pub fn new() -> Result<Self, TclError> {
        Self::with_variables(OsvvmVariables::default())
    }

    pub fn with_variables(variables: OsvvmVariables) -> Result<Self, TclError> {
        let mut interp = Interp::new();
        let context_id = interp.save_context(Context::new());

        load_osvvm_defaults(&mut interp, &variables)?;
        procedures::register_all(&mut interp, context_id);

        Ok(Self { interp, context_id })
    }

    /// The context bound to this interpreter.
    pub fn context(&mut self) -> &mut Context {
        self.interp.context::<Context>(self.context_id)
    }

    /// Evaluates a script fragment and returns the result value's string
    /// representation (e.g. the year for `GetVHDLVersion`).
    pub fn eval(&mut self, script: &str) -> Result<String, TclError> {
        match self.interp.eval(script) {
            Ok(value) => Ok(value.as_str().to_string()),
            Err(exception) => Err(self.script_error(exception)),
        }
    }

    /// Evaluates the script file at `path`.
    pub fn evaluate_file(&mut self, path: &Path) -> Result<(), TclError> {
        let source = fs::read_to_string(path)?;
        debug!(file = %path.display(), "evaluating script");
        self.eval(&source).map(|_| ())
    }

    /// Registers `path` in the included-files list, then evaluates it.
    pub fn load_pro_file(&mut self, path: &Path) -> Result<(), TclError> {
        let resolved = self.context().include_file(path);
        self.evaluate_file(&resolved)
    }

    /// Convenience entry point for a top-level regression script: clears
    /// stale diagnostics, names the project after the file stem, evaluates
    /// the script, and returns the project handle. Aggregate counts
    /// (builds, included files) are read from [`ProFileProcessor::context`].
    pub fn load_regression_file(&mut self, path: &Path) -> Result<ProjectRef, TclError> {
        {
            let context = self.context();
            context.take_last_error();
            if let Some(stem) = path.file_stem() {
                context.project().borrow_mut().name = stem.to_string_lossy().into_owned();
            }
        }
        info!(file = %path.display(), "loading regression file");
        self.load_pro_file(path)?;
        Ok(self.context().project())
    }

    /// Prefers the original error a handler parked in the context over the
    /// interpreter's flattened message.
    fn script_error(&mut self, exception: Exception) -> TclError {
        let message = exception.value().as_str().to_string();
        let cause = self.context().take_last_error();
        TclError::ScriptEvaluation { message, cause }
    }
}

fn load_osvvm_defaults(interp: &mut Interp, variables: &OsvvmVariables) -> Result<(), TclError> {
    // Values mirror what OSVVM's own scripts expect to find; only the tool
    // identity is configurable.
    let defaults: Vec<(&str, Value)> = vec![
        ("::osvvm::VhdlVersion", Value::from(2019_i64)),
        ("::osvvm::ToolVendor", Value::from("???")),
        ("::osvvm::ToolName", Value::from(variables.tool_name.as_str())),
        ("::osvvm::ToolNameVersion", Value::from("???")),
        ("::osvvm::ToolSupportsDeferredConstants", Value::from(1_i64)),
        ("::osvvm::ToolSupportsGenericPackages", Value::from(1_i64)),
        (
            "::osvvm::FunctionalCoverageIntegratedInSimulator",
            Value::from("default"),
        ),
        ("::osvvm::Support2019FilePath", Value::from(1_i64)),
        ("::osvvm::ClockResetVersion", Value::from(0_i64)),
    ];

    for (name, value) in defaults {
        interp
            .set_var(&Value::from(name), value)
            .map_err(|exception| {
                TclError::Configuration(exception.value().as_str().to_string())
            })?;
    }
    Ok(())
}
