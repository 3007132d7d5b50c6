//! Procedure handlers for the `.pro` command vocabulary
//!
//! Each handler is a thin argument shim: it validates the word count,
//! parses any tagged options, and delegates to the [`Context`] bound to the
//! interpreter. Handlers never swallow a model error — they park it in the
//! context side channel and signal the interpreter, so the processor can
//! recover the original error object after the interpreter has flattened it
//! to a string.

use std::fs;
use std::path::{Path, PathBuf};

use molt::types::{ContextID, Exception, MoltResult};
use molt::{check_args, molt_ok, Interp, Value};
use osvvm_model::{Context, ModelError, DEFAULT_NAME};

use crate::options::{self, CommandOptions};

/// Registers every procedure under its canonical `.pro` name, plus the
/// `puts` override that keeps interpreter console chatter out of the
/// tool's own output. The list is closed; a verb appears exactly once.
pub fn register_all(interp: &mut Interp, context_id: ContextID) {
    interp.add_command("puts", cmd_noop);

    interp.add_context_command("build", cmd_build, context_id);
    interp.add_context_command("include", cmd_include, context_id);
    interp.add_context_command("library", cmd_library, context_id);
    interp.add_context_command("analyze", cmd_analyze, context_id);
    interp.add_context_command("simulate", cmd_simulate, context_id);
    interp.add_command("generic", cmd_generic);
    interp.add_command("BuildName", cmd_build_name);

    interp.add_context_command("TestSuite", cmd_test_suite, context_id);
    interp.add_context_command("TestName", cmd_test_name, context_id);
    interp.add_context_command("RunTest", cmd_run_test, context_id);

    interp.add_context_command("SetVHDLVersion", cmd_set_vhdl_version, context_id);
    interp.add_context_command("GetVHDLVersion", cmd_get_vhdl_version, context_id);

    interp.add_context_command("SetCoverageAnalyzeEnable", cmd_set_coverage_analyze, context_id);
    interp.add_context_command("SetCoverageSimulateEnable", cmd_set_coverage_simulate, context_id);

    interp.add_command("FileExists", cmd_file_exists);
    interp.add_command("DirectoryExists", cmd_directory_exists);
    interp.add_context_command("ChangeWorkingDirectory", cmd_change_working_directory, context_id);
}

/// Parks the original error in the context, then builds the interpreter
/// exception from its message.
fn fail(interp: &mut Interp, context_id: ContextID, error: ModelError) -> Exception {
    let message = error.to_string();
    interp.context::<Context>(context_id).record_error(error);
    Exception::molt_err(Value::from(message))
}

/// Accepted and discarded; replaces the interpreter's built-in `puts`.
fn cmd_noop(_interp: &mut Interp, _context_id: ContextID, _argv: &[Value]) -> MoltResult {
    molt_ok!()
}

/// `build <path> ?[BuildName <name>]?` — opens a build span named after the
/// option or the path's stem, evaluates the referenced script inside it,
/// and closes the span when the script finishes.
fn cmd_build(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 0, "path ?[BuildName name]?")?;

    let path = PathBuf::from(argv[1].as_str());
    let options = CommandOptions::parse(&argv[2..])?;
    let name = options
        .build_name
        .unwrap_or_else(|| file_stem(&path));

    let (resolved, begun) = {
        let context = interp.context::<Context>(context_id);
        let resolved = context.include_file(&path);
        let begun = context.begin_build(&name).map(|_| ());
        (resolved, begun)
    };
    if let Err(error) = begun {
        return Err(fail(interp, context_id, error));
    }

    let source = match read_script(&resolved) {
        Ok(source) => source,
        Err(error) => return Err(fail(interp, context_id, error)),
    };
    interp.eval(&source)?;

    let ended = interp.context::<Context>(context_id).end_build();
    if let Err(error) = ended {
        return Err(fail(interp, context_id, error));
    }
    molt_ok!()
}

/// `include <path>` — registers and evaluates the script in place; no new
/// scope is opened, so its commands affect the enclosing cursor state.
fn cmd_include(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "path")?;

    let path = PathBuf::from(argv[1].as_str());
    let resolved = interp.context::<Context>(context_id).include_file(&path);

    let source = match read_script(&resolved) {
        Ok(source) => source,
        Err(error) => return Err(fail(interp, context_id, error)),
    };
    interp.eval(&source)?;
    molt_ok!()
}

/// `library ?<name>?` — selects (creating on first use) the current
/// library.
fn cmd_library(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 1, 2, "?name?")?;

    let name = argv.get(1).map(Value::as_str);
    interp.context::<Context>(context_id).resolve_library(name);
    molt_ok!()
}

/// `analyze <path>` — records a source file in the current (or default)
/// library.
fn cmd_analyze(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "path")?;

    interp
        .context::<Context>(context_id)
        .add_source_file(argv[1].as_str());
    molt_ok!()
}

/// `simulate <toplevel> ?[generic <name> <value>]?...`
fn cmd_simulate(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 0, "toplevel ?[generic name value]?...")?;

    let toplevel = argv[1].as_str();
    let options = CommandOptions::parse(&argv[2..])?;
    if options.build_name.is_some() {
        return Err(Exception::molt_err(Value::from(
            "BuildName is only valid for build",
        )));
    }
    interp
        .context::<Context>(context_id)
        .simulate(toplevel, options.generics);
    molt_ok!()
}

/// `generic <name> <value>` — argument producer; returns the tagged pair
/// consumed by `simulate`/`RunTest` and mutates nothing.
fn cmd_generic(_interp: &mut Interp, _context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 3, 3, "name value")?;
    molt_ok!(options::generic_value(&argv[1], &argv[2]))
}

/// `BuildName <name>` — argument producer for `build`.
fn cmd_build_name(_interp: &mut Interp, _context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "name")?;
    molt_ok!(options::build_name_value(&argv[1]))
}

/// `TestSuite ?<name>?` — selects (creating on first use) the current
/// testsuite.
fn cmd_test_suite(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 1, 2, "?name?")?;

    let name = argv.get(1).map(Value::as_str);
    interp.context::<Context>(context_id).resolve_testsuite(name);
    molt_ok!()
}

/// `TestName ?<name>?` — selects (creating on first use) the current
/// testcase under the current testsuite.
fn cmd_test_name(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 1, 2, "?name?")?;

    let name = argv.get(1).map(Value::as_str).unwrap_or(DEFAULT_NAME);
    interp.context::<Context>(context_id).resolve_testcase(name);
    molt_ok!()
}

/// `RunTest <path> ?[generic <name> <value>]?...` — compile + run
/// shortcut: analyzes the file and creates/updates a testcase named after
/// its stem.
fn cmd_run_test(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 0, "path ?[generic name value]?...")?;

    let path = PathBuf::from(argv[1].as_str());
    let options = CommandOptions::parse(&argv[2..])?;
    if options.build_name.is_some() {
        return Err(Exception::molt_err(Value::from(
            "BuildName is only valid for build",
        )));
    }
    interp
        .context::<Context>(context_id)
        .run_test(&path, options.generics);
    molt_ok!()
}

/// `SetVHDLVersion <year>`
fn cmd_set_vhdl_version(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "year")?;

    let raw = argv[1].as_int()?;
    // An out-of-range year never matches a revision; 0 stands in for it.
    let year = u16::try_from(raw).unwrap_or(0);
    let set = interp.context::<Context>(context_id).set_vhdl_version(year);
    if let Err(error) = set {
        return Err(fail(interp, context_id, error));
    }
    molt_ok!()
}

/// `GetVHDLVersion` — returns the revision year to the script.
fn cmd_get_vhdl_version(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 1, 1, "")?;

    let year = interp.context::<Context>(context_id).vhdl_version().year();
    molt_ok!(Value::from(year as i64))
}

/// `SetCoverageAnalyzeEnable <bool>`
fn cmd_set_coverage_analyze(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "enable")?;

    let enable = argv[1].as_bool()?;
    interp
        .context::<Context>(context_id)
        .set_coverage_analyze(enable);
    molt_ok!()
}

/// `SetCoverageSimulateEnable <bool>`
fn cmd_set_coverage_simulate(interp: &mut Interp, context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "enable")?;

    let enable = argv[1].as_bool()?;
    interp
        .context::<Context>(context_id)
        .set_coverage_simulate(enable);
    molt_ok!()
}

/// `FileExists <path>` — filesystem probe, returns 1/0, no model mutation.
fn cmd_file_exists(_interp: &mut Interp, _context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "path")?;

    let exists = Path::new(argv[1].as_str()).is_file();
    molt_ok!(Value::from(exists as i64))
}

/// `DirectoryExists <path>` — filesystem probe, returns 1/0.
fn cmd_directory_exists(_interp: &mut Interp, _context_id: ContextID, argv: &[Value]) -> MoltResult {
    check_args(1, argv, 2, 2, "path")?;

    let exists = Path::new(argv[1].as_str()).is_dir();
    molt_ok!(Value::from(exists as i64))
}

/// `ChangeWorkingDirectory <path>`
fn cmd_change_working_directory(
    interp: &mut Interp,
    context_id: ContextID,
    argv: &[Value],
) -> MoltResult {
    check_args(1, argv, 2, 2, "path")?;

    let path = PathBuf::from(argv[1].as_str());
    let changed = interp
        .context::<Context>(context_id)
        .change_working_directory(&path)
        .map(|_| ());
    if let Err(error) = changed {
        return Err(fail(interp, context_id, error));
    }
    molt_ok!()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

fn read_script(path: &Path) -> Result<String, ModelError> {
    fs::read_to_string(path).map_err(|error| ModelError::ScriptRead {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}
