//! Projects and builds

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::Serialize;

use crate::library::{LibraryRef, VhdlLibrary};
use crate::testsuite::{Testsuite, TestsuiteRef};

/// Shared handle to a [`Project`].
pub type ProjectRef = Rc<RefCell<Project>>;

/// Shared handle to a [`Build`].
pub type BuildRef = Rc<RefCell<Build>>;

/// Root of the model: an ordered collection of builds.
#[derive(Debug, Serialize)]
pub struct Project {
    pub name: String,
    pub builds: IndexMap<String, BuildRef>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builds: IndexMap::new(),
        }
    }

    pub fn new_ref(name: impl Into<String>) -> ProjectRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    /// Registers `build` under its name, wiring the back-reference.
    pub fn add_build(project: &ProjectRef, build: &BuildRef) {
        build.borrow_mut().project = Some(Rc::downgrade(project));
        let name = build.borrow().name.clone();
        project.borrow_mut().builds.insert(name, Rc::clone(build));
    }
}

/// One top-level compilation/simulation unit, opened by `build` and closed
/// when its script finishes evaluating.
#[derive(Debug, Serialize)]
pub struct Build {
    pub name: String,
    pub libraries: IndexMap<String, LibraryRef>,
    pub testsuites: IndexMap<String, TestsuiteRef>,
    #[serde(skip)]
    pub project: Option<Weak<RefCell<Project>>>,
}

// Manual impl: `Weak` back-references carry no identity and cannot be
// compared, so equality covers the value fields only (the same set that is
// serialized).
impl PartialEq for Build {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.libraries == other.libraries
            && self.testsuites == other.testsuites
    }
}

impl Build {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            libraries: IndexMap::new(),
            testsuites: IndexMap::new(),
            project: None,
        }
    }

    pub fn new_ref(name: impl Into<String>) -> BuildRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    pub fn project(&self) -> Option<ProjectRef> {
        self.project.as_ref().and_then(Weak::upgrade)
    }

    /// Looks up `name` among the build's libraries, creating it on first
    /// use and wiring its back-reference.
    pub fn resolve_library(build: &BuildRef, name: &str) -> LibraryRef {
        if let Some(existing) = build.borrow().libraries.get(name) {
            return Rc::clone(existing);
        }

        let library = VhdlLibrary::new_ref(name);
        library.borrow_mut().build = Some(Rc::downgrade(build));
        build
            .borrow_mut()
            .libraries
            .insert(name.to_string(), Rc::clone(&library));
        library
    }

    /// Same as [`Build::resolve_library`], for testsuites.
    pub fn resolve_testsuite(build: &BuildRef, name: &str) -> TestsuiteRef {
        if let Some(existing) = build.borrow().testsuites.get(name) {
            return Rc::clone(existing);
        }

        let testsuite = Testsuite::new_ref(name);
        testsuite.borrow_mut().build = Some(Rc::downgrade(build));
        build
            .borrow_mut()
            .testsuites
            .insert(name.to_string(), Rc::clone(&testsuite));
        testsuite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_build_sets_back_reference() {
        let project = Project::new_ref("project");
        let build = Build::new_ref("build");

        Project::add_build(&project, &build);

        assert_eq!(project.borrow().builds.len(), 1);
        let registered = Rc::clone(&project.borrow().builds["build"]);
        assert!(Rc::ptr_eq(&registered, &build));
        let parent = build.borrow().project().unwrap();
        assert!(Rc::ptr_eq(&parent, &project));
    }

    #[test]
    fn resolve_library_creates_once() {
        let build = Build::new_ref("build");

        let first = Build::resolve_library(&build, "lib");
        let second = Build::resolve_library(&build, "lib");

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(build.borrow().libraries.len(), 1);
        let parent = first.borrow().build().unwrap();
        assert!(Rc::ptr_eq(&parent, &build));
    }

    #[test]
    fn resolve_testsuite_creates_once() {
        let build = Build::new_ref("build");

        let first = Build::resolve_testsuite(&build, "ts");
        let second = Build::resolve_testsuite(&build, "ts");

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(build.borrow().testsuites.len(), 1);
    }
}
