//! Recognized trailing options for `build`, `simulate` and `RunTest`
//!
//! In a `.pro` script the optional arguments are produced by command
//! substitution, e.g. `simulate tb [generic WIDTH 8]` or
//! `build top.pro [BuildName nightly]`. The `generic` and `BuildName`
//! procedures return a tagged Tcl list, and the consuming procedure parses
//! its trailing arguments here into one explicit options structure instead
//! of each handler doing ad hoc variadic parsing.

use molt::types::Exception;
use molt::Value;
use osvvm_model::GenericValue;

pub(crate) const GENERIC_TAG: &str = "generic";
pub(crate) const BUILD_NAME_TAG: &str = "BuildName";

/// Options recognized in the trailing arguments of a procedure call.
#[derive(Debug, Default)]
pub struct CommandOptions {
    /// `[BuildName <name>]`, valid for `build` only.
    pub build_name: Option<String>,
    /// `[generic <name> <value>]` pairs in call order.
    pub generics: Vec<GenericValue>,
}

impl CommandOptions {
    /// Parses the arguments following the positional ones. Anything that is
    /// not a well-formed tagged list is reported back to the script.
    pub fn parse(argv: &[Value]) -> Result<Self, Exception> {
        let mut options = Self::default();
        for arg in argv {
            let list = arg.as_list()?;
            match list.first().map(Value::as_str) {
                Some(GENERIC_TAG) if list.len() == 3 => {
                    options
                        .generics
                        .push(GenericValue::new(list[1].as_str(), list[2].as_str()));
                }
                Some(BUILD_NAME_TAG) if list.len() == 2 => {
                    options.build_name = Some(list[1].as_str().to_string());
                }
                _ => {
                    return Err(Exception::molt_err(Value::from(format!(
                        "unrecognized option \"{}\"",
                        arg.as_str()
                    ))));
                }
            }
        }
        Ok(options)
    }
}

/// The tagged list returned by the `generic` procedure.
pub(crate) fn generic_value(name: &Value, value: &Value) -> Value {
    Value::from(vec![Value::from(GENERIC_TAG), name.clone(), value.clone()])
}

/// The tagged list returned by the `BuildName` procedure.
pub(crate) fn build_name_value(name: &Value) -> Value {
    Value::from(vec![Value::from(BUILD_NAME_TAG), name.clone()])
}
