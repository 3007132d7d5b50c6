//! The processing context: a mutable cursor over the project model
//!
//! One `Context` exists per script-evaluation session. Procedure handlers
//! mutate it as the interpreter replays the `.pro` script: `library` moves
//! the library cursor, `analyze` appends to whatever that cursor points at,
//! `build`/`EndBuild` open and close a build span, and so on. The object
//! graph reachable from the context IS the result of processing; there is
//! no separate build step.

use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ModelError;
use crate::library::{LibraryRef, SourceFileRef, VhdlLibrary, VhdlSourceFile};
use crate::project::{Build, BuildRef, Project, ProjectRef};
use crate::testsuite::{GenericValue, TestcaseRef, Testsuite, TestsuiteRef};
use crate::vhdl::VhdlVersion;

/// Name substituted whenever a name-bearing procedure omits its argument.
pub const DEFAULT_NAME: &str = "default";

/// State cursor shared by all procedure handlers of one session.
///
/// The current build, library, testsuite and testcase are independent axes:
/// setting one does not clear the others (opening or closing a build is the
/// exception, since entities created inside the span belong to the build).
#[derive(Debug)]
pub struct Context {
    project: ProjectRef,
    working_directory: PathBuf,
    build: Option<BuildRef>,
    library: Option<LibraryRef>,
    testsuite: Option<TestsuiteRef>,
    testcase: Option<TestcaseRef>,
    /// Libraries created outside any build span.
    libraries: IndexMap<String, LibraryRef>,
    /// Testsuites created outside any build span.
    testsuites: IndexMap<String, TestsuiteRef>,
    /// Every file passed to `build`/`include`, in call order, duplicates
    /// kept.
    included_files: Vec<PathBuf>,
    vhdl_version: VhdlVersion,
    coverage_analyze: bool,
    coverage_simulate: bool,
    /// Side channel for recovering the original error when the interpreter
    /// reports only a stringified failure.
    last_error: Option<ModelError>,
}

impl Context {
    pub fn new() -> Self {
        let working_directory = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            project: Project::new_ref(DEFAULT_NAME),
            working_directory,
            build: None,
            library: None,
            testsuite: None,
            testcase: None,
            libraries: IndexMap::new(),
            testsuites: IndexMap::new(),
            included_files: Vec::new(),
            vhdl_version: VhdlVersion::default(),
            coverage_analyze: false,
            coverage_simulate: false,
            last_error: None,
        }
    }

    /// Discards all accumulated state and restores initial defaults.
    /// Callable any number of times.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // --- accessors -----------------------------------------------------

    pub fn project(&self) -> ProjectRef {
        Rc::clone(&self.project)
    }

    /// The currently open build, if any. Still `Some` after evaluation
    /// means the script never closed its build.
    pub fn build(&self) -> Option<BuildRef> {
        self.build.as_ref().map(Rc::clone)
    }

    pub fn library(&self) -> Option<LibraryRef> {
        self.library.as_ref().map(Rc::clone)
    }

    pub fn testsuite(&self) -> Option<TestsuiteRef> {
        self.testsuite.as_ref().map(Rc::clone)
    }

    pub fn testcase(&self) -> Option<TestcaseRef> {
        self.testcase.as_ref().map(Rc::clone)
    }

    /// Top-level libraries (those created while no build was open).
    pub fn libraries(&self) -> &IndexMap<String, LibraryRef> {
        &self.libraries
    }

    /// Top-level testsuites.
    pub fn testsuites(&self) -> &IndexMap<String, TestsuiteRef> {
        &self.testsuites
    }

    pub fn included_files(&self) -> &[PathBuf] {
        &self.included_files
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    // --- VHDL version ---------------------------------------------------

    pub fn vhdl_version(&self) -> VhdlVersion {
        self.vhdl_version
    }

    pub fn set_vhdl_version(&mut self, year: u16) -> Result<(), ModelError> {
        self.vhdl_version = VhdlVersion::from_year(year)?;
        Ok(())
    }

    // --- coverage toggles ----------------------------------------------

    pub fn coverage_analyze(&self) -> bool {
        self.coverage_analyze
    }

    pub fn set_coverage_analyze(&mut self, enable: bool) {
        self.coverage_analyze = enable;
    }

    pub fn coverage_simulate(&self) -> bool {
        self.coverage_simulate
    }

    pub fn set_coverage_simulate(&mut self, enable: bool) {
        self.coverage_simulate = enable;
    }

    // --- build span -----------------------------------------------------

    /// Opens a new build and makes it current. Builds do not nest, and a
    /// name already registered in the project is rejected up front.
    pub fn begin_build(&mut self, name: &str) -> Result<BuildRef, ModelError> {
        if let Some(open) = &self.build {
            return Err(ModelError::BuildAlreadyOpen(open.borrow().name.clone()));
        }
        if self.project.borrow().builds.contains_key(name) {
            return Err(ModelError::DuplicateBuild(name.to_string()));
        }

        let build = Build::new_ref(name);
        self.build = Some(Rc::clone(&build));
        // Entities created inside the span must attach to the build, not
        // to whatever was current before it.
        self.library = None;
        self.testsuite = None;
        self.testcase = None;

        debug!(build = name, "opened build");
        Ok(build)
    }

    /// Closes the current build and registers it in the project.
    pub fn end_build(&mut self) -> Result<BuildRef, ModelError> {
        let build = self.build.take().ok_or(ModelError::NoOpenBuild)?;
        Project::add_build(&self.project, &build);
        self.library = None;
        self.testsuite = None;
        self.testcase = None;

        debug!(build = %build.borrow().name, "closed build");
        Ok(build)
    }

    // --- cursor resolution ----------------------------------------------

    /// Returns the named library in the current build (or the top-level
    /// collection if no build is open), creating it on first use, and makes
    /// it current. `None` resolves to `"default"`.
    pub fn resolve_library(&mut self, name: Option<&str>) -> LibraryRef {
        let name = name.unwrap_or(DEFAULT_NAME);
        let library = match &self.build {
            Some(build) => Build::resolve_library(build, name),
            None => match self.libraries.get(name) {
                Some(existing) => Rc::clone(existing),
                None => {
                    let library = VhdlLibrary::new_ref(name);
                    self.libraries
                        .insert(name.to_string(), Rc::clone(&library));
                    debug!(library = name, "created library");
                    library
                }
            },
        };
        self.library = Some(Rc::clone(&library));
        library
    }

    /// Same resolution rule as [`Context::resolve_library`], for
    /// testsuites.
    pub fn resolve_testsuite(&mut self, name: Option<&str>) -> TestsuiteRef {
        let name = name.unwrap_or(DEFAULT_NAME);
        let testsuite = match &self.build {
            Some(build) => Build::resolve_testsuite(build, name),
            None => match self.testsuites.get(name) {
                Some(existing) => Rc::clone(existing),
                None => {
                    let testsuite = Testsuite::new_ref(name);
                    self.testsuites
                        .insert(name.to_string(), Rc::clone(&testsuite));
                    debug!(testsuite = name, "created testsuite");
                    testsuite
                }
            },
        };
        self.testsuite = Some(Rc::clone(&testsuite));
        testsuite
    }

    /// Resolves `name` under the current testsuite (itself defaulted to
    /// `"default"`), creating an empty testcase on first use, and makes it
    /// current.
    pub fn resolve_testcase(&mut self, name: &str) -> TestcaseRef {
        let testsuite = match &self.testsuite {
            Some(existing) => Rc::clone(existing),
            None => self.resolve_testsuite(None),
        };
        let testcase = Testsuite::resolve_testcase(&testsuite, name);
        self.testcase = Some(Rc::clone(&testcase));
        testcase
    }

    // --- procedure semantics --------------------------------------------

    /// `analyze`: appends a source file to the current library (creating
    /// `"default"` if none is selected), tagged with the session's VHDL
    /// version. The path is stored as written in the script.
    pub fn add_source_file(&mut self, path: impl Into<PathBuf>) -> SourceFileRef {
        let library = match &self.library {
            Some(existing) => Rc::clone(existing),
            None => self.resolve_library(None),
        };
        let file = VhdlSourceFile::new(path, self.vhdl_version);
        VhdlLibrary::add_file(&library, file)
    }

    /// `simulate`: reuses the current testcase, or resolves one named after
    /// the toplevel entity; records the toplevel override and the generic
    /// values in call order.
    pub fn simulate(
        &mut self,
        toplevel: &str,
        generics: impl IntoIterator<Item = GenericValue>,
    ) -> TestcaseRef {
        let testcase = match &self.testcase {
            Some(existing) => Rc::clone(existing),
            None => self.resolve_testcase(toplevel),
        };
        {
            let mut testcase = testcase.borrow_mut();
            testcase.toplevel_name = Some(toplevel.to_string());
            for generic in generics {
                testcase.set_generic(generic);
            }
        }
        self.testcase = Some(Rc::clone(&testcase));
        testcase
    }

    /// `RunTest`: analyze + simulate shortcut. The testcase name derives
    /// from the source path's file stem; no toplevel override is recorded.
    pub fn run_test(
        &mut self,
        path: &Path,
        generics: impl IntoIterator<Item = GenericValue>,
    ) -> TestcaseRef {
        self.add_source_file(path);

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        let testcase = self.resolve_testcase(&name);
        {
            let mut testcase = testcase.borrow_mut();
            for generic in generics {
                testcase.set_generic(generic);
            }
        }
        testcase
    }

    // --- files and directories ------------------------------------------

    /// Resolves `path` against the working directory, records it in the
    /// included-files list (unconditionally), and returns the resolved
    /// path for the caller to feed to the script evaluator.
    pub fn include_file(&mut self, path: &Path) -> PathBuf {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory.join(path)
        };
        self.included_files.push(resolved.clone());
        debug!(file = %resolved.display(), "registered included file");
        resolved
    }

    /// `ChangeWorkingDirectory`: relative targets resolve against the
    /// current working directory.
    pub fn change_working_directory(&mut self, path: &Path) -> Result<&Path, ModelError> {
        let target = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory.join(path)
        };
        if !target.is_dir() {
            return Err(ModelError::NotADirectory(target));
        }
        self.working_directory = target;
        Ok(&self.working_directory)
    }

    // --- error side channel ---------------------------------------------

    /// Parks the original error before it is flattened to a string at the
    /// interpreter boundary.
    pub fn record_error(&mut self, error: ModelError) {
        self.last_error = Some(error);
    }

    /// Takes the parked error, leaving the slot empty.
    pub fn take_last_error(&mut self) -> Option<ModelError> {
        self.last_error.take()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_without_library_creates_default() {
        let mut context = Context::new();

        context.add_source_file("tests/examples/simple/lib1_file1.vhdl");

        assert_eq!(context.libraries().len(), 1);
        let library = context.library().unwrap();
        assert_eq!(library.borrow().name, "default");
        assert!(Rc::ptr_eq(&library, &context.libraries()["default"]));
        assert_eq!(library.borrow().files.len(), 1);
        assert_eq!(
            library.borrow().files[0].borrow().path,
            Path::new("tests/examples/simple/lib1_file1.vhdl")
        );
        assert_eq!(
            library.borrow().files[0].borrow().vhdl_version,
            VhdlVersion::Vhdl2008
        );
    }

    #[test]
    fn files_attach_to_most_recently_selected_library() {
        let mut context = Context::new();

        context.resolve_library(Some("lib1"));
        context.add_source_file("lib1_file1.vhdl");
        context.resolve_library(Some("lib2"));
        context.add_source_file("lib2_file1.vhdl");
        context.resolve_library(Some("lib1"));
        context.add_source_file("lib1_file2.vhdl");

        assert_eq!(context.libraries().len(), 2);
        let lib1 = &context.libraries()["lib1"];
        assert_eq!(lib1.borrow().files.len(), 2);
        assert_eq!(lib1.borrow().files[0].borrow().path, Path::new("lib1_file1.vhdl"));
        assert_eq!(lib1.borrow().files[1].borrow().path, Path::new("lib1_file2.vhdl"));
        let lib2 = &context.libraries()["lib2"];
        assert_eq!(lib2.borrow().files.len(), 1);
    }

    #[test]
    fn build_span_attaches_entities_to_build() {
        let mut context = Context::new();
        context.resolve_library(Some("outside"));

        let build = context.begin_build("b").unwrap();
        context.resolve_library(Some("inside"));
        context.add_source_file("inside.vhdl");
        context.resolve_testsuite(Some("ts"));
        context.end_build().unwrap();

        assert!(context.build().is_none());
        assert_eq!(context.project().borrow().builds.len(), 1);
        assert!(Rc::ptr_eq(&context.project().borrow().builds["b"], &build));
        assert_eq!(build.borrow().libraries.len(), 1);
        assert!(build.borrow().libraries.contains_key("inside"));
        assert_eq!(build.borrow().testsuites.len(), 1);
        // The top level only has what was created before the span.
        assert_eq!(context.libraries().len(), 1);
        assert!(context.libraries().contains_key("outside"));
    }

    #[test]
    fn builds_do_not_nest() {
        let mut context = Context::new();
        context.begin_build("outer").unwrap();

        assert_eq!(
            context.begin_build("inner"),
            Err(ModelError::BuildAlreadyOpen("outer".to_string()))
        );
    }

    #[test]
    fn end_build_without_open_build_fails() {
        let mut context = Context::new();
        assert_eq!(context.end_build(), Err(ModelError::NoOpenBuild));
    }

    #[test]
    fn duplicate_build_name_is_rejected() {
        let mut context = Context::new();
        context.begin_build("project").unwrap();
        context.end_build().unwrap();

        assert_eq!(
            context.begin_build("project"),
            Err(ModelError::DuplicateBuild("project".to_string()))
        );
        assert_eq!(context.project().borrow().builds.len(), 1);
    }

    #[test]
    fn testcase_defaults_to_default_testsuite() {
        let mut context = Context::new();

        let testcase = context.resolve_testcase("tn");

        assert_eq!(context.testsuites().len(), 1);
        let testsuite = context.testsuite().unwrap();
        assert_eq!(testsuite.borrow().name, "default");
        assert_eq!(testsuite.borrow().testcases.len(), 1);
        assert_eq!(testcase.borrow().name, "tn");
        assert!(Rc::ptr_eq(&testcase, &context.testcase().unwrap()));
        assert_eq!(testcase.borrow().generics.len(), 0);
    }

    #[test]
    fn simulate_records_toplevel_and_generics() {
        let mut context = Context::new();

        let testcase = context.simulate(
            "tb_top",
            vec![
                GenericValue::new("WIDTH", "8"),
                GenericValue::new("WIDTH", "16"),
            ],
        );

        assert_eq!(testcase.borrow().name, "tb_top");
        assert_eq!(testcase.borrow().toplevel_name.as_deref(), Some("tb_top"));
        assert_eq!(testcase.borrow().generics["WIDTH"], "16");
    }

    #[test]
    fn simulate_reuses_current_testcase() {
        let mut context = Context::new();
        let named = context.resolve_testcase("tn");

        let simulated = context.simulate("tb_top", Vec::new());

        assert!(Rc::ptr_eq(&named, &simulated));
        assert_eq!(named.borrow().name, "tn");
        assert_eq!(named.borrow().toplevel_name.as_deref(), Some("tb_top"));
    }

    #[test]
    fn run_test_names_testcase_from_file_stem() {
        let mut context = Context::new();

        let testcase = context.run_test(
            Path::new("tests/examples/simple/lib1_file1.vhdl"),
            vec![GenericValue::new("G1", "v1"), GenericValue::new("G2", "v2")],
        );

        let library = context.library().unwrap();
        assert_eq!(library.borrow().name, "default");
        assert_eq!(library.borrow().files.len(), 1);
        assert_eq!(testcase.borrow().name, "lib1_file1");
        assert!(testcase.borrow().toplevel_name.is_none());
        let pairs: Vec<_> = testcase
            .borrow()
            .generics
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("G1".to_string(), "v1".to_string()),
                ("G2".to_string(), "v2".to_string())
            ]
        );
    }

    #[test]
    fn included_files_accumulate_without_dedup() {
        let mut context = Context::new();

        context.include_file(Path::new("a.pro"));
        context.include_file(Path::new("b.pro"));
        context.include_file(Path::new("a.pro"));

        assert_eq!(context.included_files().len(), 3);
    }

    #[test]
    fn include_file_resolves_against_working_directory() {
        let mut context = Context::new();

        let resolved = context.include_file(Path::new("scripts/build.pro"));

        assert!(resolved.is_absolute() || context.working_directory() == Path::new("."));
        assert!(resolved.ends_with("scripts/build.pro"));
    }

    #[test]
    fn change_working_directory_rejects_missing_directory() {
        let mut context = Context::new();
        let temp = tempfile::TempDir::new().unwrap();

        context.change_working_directory(temp.path()).unwrap();
        assert_eq!(context.working_directory(), temp.path());

        let missing = temp.path().join("does-not-exist");
        assert!(matches!(
            context.change_working_directory(&missing),
            Err(ModelError::NotADirectory(_))
        ));
    }

    #[test]
    fn vhdl_version_round_trips() {
        let mut context = Context::new();
        assert_eq!(context.vhdl_version().year(), 2008);

        for year in [1987, 1993, 2002, 2008, 2019] {
            context.set_vhdl_version(year).unwrap();
            assert_eq!(context.vhdl_version().year(), year);
        }
        assert_eq!(
            context.set_vhdl_version(1999),
            Err(ModelError::UnsupportedVhdlVersion(1999))
        );
    }

    #[test]
    fn clear_is_idempotent() {
        let mut context = Context::new();
        context.resolve_library(Some("lib"));
        context.include_file(Path::new("a.pro"));
        context.set_vhdl_version(2019).unwrap();
        context.record_error(ModelError::NoOpenBuild);

        context.clear();
        context.clear();

        assert_eq!(context.libraries().len(), 0);
        assert_eq!(context.included_files().len(), 0);
        assert!(context.library().is_none());
        assert_eq!(context.vhdl_version().year(), 2008);
        assert!(context.take_last_error().is_none());
    }
}
