//! Restricted execution of learner-submitted source against a single input.

use std::fmt;

use contracts::SandboxLimits;
use serde_json::Value as JsonValue;

use crate::script::{self, Program, Value};

/// The single symbol a submission must define.
pub const ENTRY_POINT: &str = "solve";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    EntryPointMissing,
    Runtime(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryPointMissing => write!(f, "function {ENTRY_POINT}() not found"),
            Self::Runtime(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for Fault {}

fn load(source: &str) -> Result<Program, Fault> {
    let program = script::parse(source).map_err(|err| Fault::Runtime(format!("parse error: {err}")))?;
    if program.function(ENTRY_POINT).is_none() {
        return Err(Fault::EntryPointMissing);
    }
    Ok(program)
}

/// Load-time validation only: parse and entry-point lookup, no execution.
pub fn check(source: &str) -> Result<(), Fault> {
    load(source).map(|_| ())
}

/// Run the submission's entry point against one test input.
///
/// The entry point is invoked with no arguments when `input` is absent and
/// with exactly one argument otherwise; multi-argument problems pack their
/// arguments into a single list the candidate destructures itself. A fresh
/// value is built from the fixture on every call, so in-place mutation by one
/// run can never be observed by another.
pub fn execute(
    source: &str,
    input: Option<&JsonValue>,
    limits: &SandboxLimits,
) -> Result<Value, Fault> {
    let program = load(source)?;
    let args = match input {
        None => Vec::new(),
        Some(fixture) => vec![script::value_from_json(fixture).map_err(Fault::Runtime)?],
    };
    script::run_program(&program, ENTRY_POINT, args, limits)
        .map_err(|err| Fault::Runtime(err.to_string()))
}
