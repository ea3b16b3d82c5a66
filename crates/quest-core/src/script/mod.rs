//! The submission scripting language: lexer, parser, and tree-walking
//! interpreter. The interpreter is the capability boundary: the language
//! exposes an allow-listed table of pure builtins and nothing else, with no
//! filesystem, network, process, clock, or import surface.

mod interp;
mod lexer;
mod parser;

pub use interp::{run_program, RuntimeError};
pub use parser::{parse, FnDef, ParseError, Program};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value as JsonValue;

/// Runtime value. Lists have reference semantics within a run, as in the
/// reference interpreter; the harness hands each invocation a freshly built
/// value so mutation never crosses runs.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    pub fn str(text: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(text.as_ref()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }

    /// Recursively independent copy; shared list handles are severed.
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::List(items) => {
                let copied = items.borrow().iter().map(Value::deep_copy).collect();
                Self::list(copied)
            }
            other => other.clone(),
        }
    }
}

/// Value equality over structured data: elementwise for lists, numeric
/// cross-equality between ints and floats (`6 == 6.0`), never identity.
pub fn structural_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| structural_eq(x, y))
        }
        _ => false,
    }
}

/// Convert a catalog fixture into a fresh runtime value.
pub fn value_from_json(fixture: &JsonValue) -> Result<Value, String> {
    match fixture {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(flag) => Ok(Value::Bool(*flag)),
        JsonValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(Value::Int(int))
            } else if let Some(float) = number.as_f64() {
                Ok(Value::Float(float))
            } else {
                Err(format!("unsupported numeric fixture: {number}"))
            }
        }
        JsonValue::String(text) => Ok(Value::str(text)),
        JsonValue::Array(items) => {
            let converted = items
                .iter()
                .map(value_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(converted))
        }
        JsonValue::Object(_) => Err("unsupported object value in test fixture".to_string()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::Str(text) => f.write_str(text),
            Self::List(items) => {
                f.write_str("[")?;
                for (position, item) in items.borrow().iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Self::Str(text) => write!(f, "\"{text}\"")?,
                        nested => write!(f, "{nested}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}
