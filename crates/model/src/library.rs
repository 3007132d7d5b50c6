//! VHDL libraries and their analyzed source files

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::project::{Build, BuildRef};
use crate::vhdl::VhdlVersion;

/// Shared handle to a [`VhdlSourceFile`].
pub type SourceFileRef = Rc<RefCell<VhdlSourceFile>>;

/// Shared handle to a [`VhdlLibrary`].
pub type LibraryRef = Rc<RefCell<VhdlLibrary>>;

/// A source file recorded by `analyze`, tagged with the VHDL revision that
/// was configured when it was seen.
#[derive(Debug, Serialize)]
pub struct VhdlSourceFile {
    /// Path as written in the script.
    pub path: PathBuf,
    pub vhdl_version: VhdlVersion,
    /// Set when the file is appended to a library, `None` before.
    #[serde(skip)]
    pub library: Option<Weak<RefCell<VhdlLibrary>>>,
}

// Manual impl: the `Weak` back-reference cannot be compared, so equality
// covers the serialized value fields only.
impl PartialEq for VhdlSourceFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.vhdl_version == other.vhdl_version
    }
}

impl VhdlSourceFile {
    pub fn new(path: impl Into<PathBuf>, vhdl_version: VhdlVersion) -> Self {
        Self {
            path: path.into(),
            vhdl_version,
            library: None,
        }
    }

    /// The owning library, if the file has been attached to one.
    pub fn library(&self) -> Option<LibraryRef> {
        self.library.as_ref().and_then(Weak::upgrade)
    }
}

/// A named grouping of analyzed source files, mirroring VHDL's library
/// concept. File order is the order of the `analyze` calls.
#[derive(Debug, Serialize)]
pub struct VhdlLibrary {
    pub name: String,
    pub files: Vec<SourceFileRef>,
    /// Set when the library is created inside an open build, `None` for a
    /// standalone (top-level) library.
    #[serde(skip)]
    pub build: Option<Weak<RefCell<Build>>>,
}

// Manual impl: the `Weak` back-reference cannot be compared, so equality
// covers the serialized value fields only.
impl PartialEq for VhdlLibrary {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.files == other.files
    }
}

impl VhdlLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            build: None,
        }
    }

    pub fn new_ref(name: impl Into<String>) -> LibraryRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    /// The owning build, if any.
    pub fn build(&self) -> Option<BuildRef> {
        self.build.as_ref().and_then(Weak::upgrade)
    }

    /// Appends `file` to `library`, wiring the file's back-reference.
    pub fn add_file(library: &LibraryRef, file: VhdlSourceFile) -> SourceFileRef {
        let file = Rc::new(RefCell::new(file));
        file.borrow_mut().library = Some(Rc::downgrade(library));
        library.borrow_mut().files.push(Rc::clone(&file));
        file
    }
}
