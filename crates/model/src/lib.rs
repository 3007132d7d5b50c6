//! osvvm-model: the OSVVM project model
//!
//! Pure data holders for the entity tree built while processing `.pro`
//! scripts, plus the [`Context`] cursor that the Tcl procedure handlers
//! mutate:
//! - Project → Build → VHDL libraries (with source files) and testsuites
//!   (with testcases and generic values)
//! - `Context`: the single mutable "current position" over that tree
//!
//! Entities are shared through `Rc<RefCell<_>>` handles with `Weak` parent
//! back-references, so the cursor and the owning collections can point at
//! the same node.

mod context;
mod error;
mod library;
mod project;
mod testsuite;
mod vhdl;

pub use context::{Context, DEFAULT_NAME};
pub use error::ModelError;
pub use library::{LibraryRef, SourceFileRef, VhdlLibrary, VhdlSourceFile};
pub use project::{Build, BuildRef, Project, ProjectRef};
pub use testsuite::{GenericValue, Testcase, TestcaseRef, Testsuite, TestsuiteRef};
pub use vhdl::VhdlVersion;
