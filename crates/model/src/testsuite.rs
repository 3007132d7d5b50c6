//! Testsuites, testcases and generic parameter values

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::Serialize;

use crate::project::{Build, BuildRef};

/// Shared handle to a [`Testcase`].
pub type TestcaseRef = Rc<RefCell<Testcase>>;

/// Shared handle to a [`Testsuite`].
pub type TestsuiteRef = Rc<RefCell<Testsuite>>;

/// A generic name/value pair produced by the `generic` procedure and
/// consumed by `simulate`/`RunTest`. Transient: the pair is folded into the
/// testcase's generics map, it is not a node of the tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenericValue {
    pub name: String,
    pub value: String,
}

impl GenericValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One simulation run, optionally parameterized by generics.
#[derive(Debug, Serialize)]
pub struct Testcase {
    pub name: String,
    /// Top-level entity override recorded by `simulate`.
    pub toplevel_name: Option<String>,
    /// Generic values in call order; a repeated name overwrites the value
    /// but keeps the original position.
    pub generics: IndexMap<String, String>,
    #[serde(skip)]
    pub testsuite: Option<Weak<RefCell<Testsuite>>>,
}

// Manual impl: the `Weak` back-reference cannot be compared, so equality
// covers the serialized value fields only.
impl PartialEq for Testcase {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.toplevel_name == other.toplevel_name
            && self.generics == other.generics
    }
}

impl Testcase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            toplevel_name: None,
            generics: IndexMap::new(),
            testsuite: None,
        }
    }

    pub fn testsuite(&self) -> Option<TestsuiteRef> {
        self.testsuite.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_generic(&mut self, generic: GenericValue) {
        self.generics.insert(generic.name, generic.value);
    }
}

/// A named grouping of testcases.
#[derive(Debug, Serialize)]
pub struct Testsuite {
    pub name: String,
    pub testcases: IndexMap<String, TestcaseRef>,
    #[serde(skip)]
    pub build: Option<Weak<RefCell<Build>>>,
}

// Manual impl: the `Weak` back-reference cannot be compared, so equality
// covers the serialized value fields only.
impl PartialEq for Testsuite {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.testcases == other.testcases
    }
}

impl Testsuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            testcases: IndexMap::new(),
            build: None,
        }
    }

    pub fn new_ref(name: impl Into<String>) -> TestsuiteRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    pub fn build(&self) -> Option<BuildRef> {
        self.build.as_ref().and_then(Weak::upgrade)
    }

    /// Looks up `name` in the suite, creating an empty testcase on first
    /// use and wiring its back-reference.
    pub fn resolve_testcase(testsuite: &TestsuiteRef, name: &str) -> TestcaseRef {
        if let Some(existing) = testsuite.borrow().testcases.get(name) {
            return Rc::clone(existing);
        }

        let testcase = Rc::new(RefCell::new(Testcase::new(name)));
        testcase.borrow_mut().testsuite = Some(Rc::downgrade(testsuite));
        testsuite
            .borrow_mut()
            .testcases
            .insert(name.to_string(), Rc::clone(&testcase));
        testcase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testcase_starts_detached() {
        let testcase = Testcase::new("tc");

        assert_eq!(testcase.name, "tc");
        assert!(testcase.testsuite().is_none());
        assert!(testcase.toplevel_name.is_none());
        assert_eq!(testcase.generics.len(), 0);
    }

    #[test]
    fn resolve_testcase_creates_once() {
        let suite = Testsuite::new_ref("ts");

        let first = Testsuite::resolve_testcase(&suite, "tc");
        let second = Testsuite::resolve_testcase(&suite, "tc");

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(suite.borrow().testcases.len(), 1);
        let parent = first.borrow().testsuite().unwrap();
        assert!(Rc::ptr_eq(&parent, &suite));
    }

    #[test]
    fn generics_overwrite_on_duplicate_name() {
        let mut testcase = Testcase::new("tc");
        testcase.set_generic(GenericValue::new("WIDTH", "8"));
        testcase.set_generic(GenericValue::new("DEPTH", "16"));
        testcase.set_generic(GenericValue::new("WIDTH", "32"));

        let pairs: Vec<_> = testcase
            .generics
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(pairs, vec![("WIDTH", "32"), ("DEPTH", "16")]);
    }
}
