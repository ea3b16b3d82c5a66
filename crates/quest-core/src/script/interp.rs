use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use contracts::SandboxLimits;

use super::parser::{BinaryOp, Expr, FnDef, Program, Stmt, UnaryOp};
use super::{structural_eq, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Run `entry` from an already-parsed program under the given ceilings.
pub fn run_program(
    program: &Program,
    entry: &str,
    args: Vec<Value>,
    limits: &SandboxLimits,
) -> Result<Value, RuntimeError> {
    let Some(fndef) = program.function(entry) else {
        return Err(RuntimeError::new(format!("function {entry}() not found")));
    };
    let mut interp = Interp {
        program,
        limits: *limits,
        fuel: limits.max_steps,
        depth: 0,
        deadline: Instant::now() + Duration::from_millis(limits.wall_clock_ms),
    };
    interp.call(fndef, args)
}

enum Flow {
    Normal,
    Return(Value),
}

#[derive(Debug)]
struct Frame {
    scopes: Vec<BTreeMap<String, Value>>,
}

impl Frame {
    fn new() -> Self {
        Self {
            scopes: vec![BTreeMap::new()],
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn assign(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }
}

struct Interp<'p> {
    program: &'p Program,
    limits: SandboxLimits,
    fuel: u64,
    depth: usize,
    deadline: Instant,
}

impl<'p> Interp<'p> {
    fn charge(&mut self) -> Result<(), RuntimeError> {
        if self.fuel == 0 {
            return Err(RuntimeError::new(format!(
                "step limit of {} exceeded",
                self.limits.max_steps
            )));
        }
        self.fuel -= 1;
        if self.fuel % 1024 == 0 && Instant::now() >= self.deadline {
            return Err(RuntimeError::new(format!(
                "wall clock limit of {}ms exceeded",
                self.limits.wall_clock_ms
            )));
        }
        Ok(())
    }

    fn check_len(&self, len: usize, what: &str) -> Result<(), RuntimeError> {
        if len > self.limits.max_collection_len {
            return Err(RuntimeError::new(format!(
                "{what} exceeds the collection limit of {} elements",
                self.limits.max_collection_len
            )));
        }
        Ok(())
    }

    fn call(&mut self, fndef: &'p FnDef, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if args.len() != fndef.params.len() {
            return Err(RuntimeError::new(format!(
                "{}() takes {} argument(s), {} given",
                fndef.name,
                fndef.params.len(),
                args.len()
            )));
        }
        if self.depth >= self.limits.max_call_depth {
            return Err(RuntimeError::new(format!(
                "call depth limit of {} exceeded",
                self.limits.max_call_depth
            )));
        }
        self.depth += 1;
        let mut frame = Frame::new();
        for (param, arg) in fndef.params.iter().zip(args) {
            frame.define(param, arg);
        }
        let flow = self.exec_stmts(&mut frame, &fndef.body)?;
        self.depth -= 1;
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Null,
        })
    }

    fn exec_block(&mut self, frame: &mut Frame, stmts: &'p [Stmt]) -> Result<Flow, RuntimeError> {
        frame.push_scope();
        let flow = self.exec_stmts(frame, stmts);
        frame.pop_scope();
        flow
    }

    fn exec_stmts(&mut self, frame: &mut Frame, stmts: &'p [Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(frame, stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, frame: &mut Frame, stmt: &'p Stmt) -> Result<Flow, RuntimeError> {
        self.charge()?;
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval(frame, value)?;
                frame.define(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                let value = self.eval(frame, value)?;
                if !frame.assign(name, value) {
                    return Err(RuntimeError::new(format!("undefined variable `{name}`")));
                }
                Ok(Flow::Normal)
            }
            Stmt::IndexAssign {
                target,
                index,
                value,
            } => {
                let target = self.eval(frame, target)?;
                let index = self.eval(frame, index)?;
                let value = self.eval(frame, value)?;
                let Value::List(items) = &target else {
                    return Err(RuntimeError::new(format!(
                        "cannot index-assign into {}",
                        target.type_name()
                    )));
                };
                let len = items.borrow().len();
                let slot = resolve_index(&index, len)?;
                items.borrow_mut()[slot] = value;
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                if self.eval_condition(frame, cond)? {
                    self.exec_block(frame, then_body)
                } else {
                    self.exec_block(frame, else_body)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval_condition(frame, cond)? {
                    if let Flow::Return(value) = self.exec_block(frame, body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                var,
                iterable,
                body,
            } => {
                let iterable = self.eval(frame, iterable)?;
                let items: Vec<Value> = match &iterable {
                    Value::List(items) => items.borrow().clone(),
                    Value::Str(text) => text.chars().map(|ch| Value::str(ch.to_string())).collect(),
                    other => {
                        return Err(RuntimeError::new(format!(
                            "cannot iterate over {}",
                            other.type_name()
                        )))
                    }
                };
                for item in items {
                    self.charge()?;
                    frame.push_scope();
                    frame.define(var, item);
                    let flow = self.exec_stmts(frame, body);
                    frame.pop_scope();
                    if let Flow::Return(value) = flow? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(frame, expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Expr(expr) => {
                self.eval(frame, expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_condition(&mut self, frame: &mut Frame, cond: &'p Expr) -> Result<bool, RuntimeError> {
        match self.eval(frame, cond)? {
            Value::Bool(flag) => Ok(flag),
            other => Err(RuntimeError::new(format!(
                "condition must be a bool, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval(&mut self, frame: &mut Frame, expr: &'p Expr) -> Result<Value, RuntimeError> {
        self.charge()?;
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(flag) => Ok(Value::Bool(*flag)),
            Expr::Int(value) => Ok(Value::Int(*value)),
            Expr::Float(value) => Ok(Value::Float(*value)),
            Expr::Str(text) => Ok(Value::str(text)),
            Expr::List(items) => {
                self.check_len(items.len(), "list literal")?;
                let values = items
                    .iter()
                    .map(|item| self.eval(frame, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(values))
            }
            Expr::Var(name) => frame
                .lookup(name)
                .ok_or_else(|| RuntimeError::new(format!("undefined variable `{name}`"))),
            Expr::Unary(op, inner) => {
                let value = self.eval(frame, inner)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Int(int) => int
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or_else(|| RuntimeError::new("integer overflow")),
                        Value::Float(float) => Ok(Value::Float(-float)),
                        other => Err(RuntimeError::new(format!(
                            "cannot negate {}",
                            other.type_name()
                        ))),
                    },
                    UnaryOp::Not => match value {
                        Value::Bool(flag) => Ok(Value::Bool(!flag)),
                        other => Err(RuntimeError::new(format!(
                            "`!` needs a bool, got {}",
                            other.type_name()
                        ))),
                    },
                }
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                if !self.eval_condition(frame, lhs)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_condition(frame, rhs)?))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                if self.eval_condition(frame, lhs)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_condition(frame, rhs)?))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(frame, lhs)?;
                let rhs = self.eval(frame, rhs)?;
                self.apply_binary(*op, lhs, rhs)
            }
            Expr::Index { target, index } => {
                let target = self.eval(frame, target)?;
                let index = self.eval(frame, index)?;
                match &target {
                    Value::List(items) => {
                        let items = items.borrow();
                        let slot = resolve_index(&index, items.len())?;
                        Ok(items[slot].clone())
                    }
                    Value::Str(text) => {
                        let chars: Vec<char> = text.chars().collect();
                        let slot = resolve_index(&index, chars.len())?;
                        Ok(Value::str(chars[slot].to_string()))
                    }
                    other => Err(RuntimeError::new(format!(
                        "cannot index into {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(frame, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(fndef) = self.program.function(name) {
                    return self.call(fndef, values);
                }
                self.call_builtin(name, values)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
        let mismatch = |op: &str, lhs: &Value, rhs: &Value| {
            RuntimeError::new(format!(
                "cannot {op} {} and {}",
                lhs.type_name(),
                rhs.type_name()
            ))
        };
        match op {
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_add(*b)
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::new("integer overflow")),
                (Value::Str(a), Value::Str(b)) => {
                    self.check_len(a.chars().count() + b.chars().count(), "string")?;
                    Ok(Value::str(format!("{a}{b}")))
                }
                (Value::List(a), Value::List(b)) => {
                    let mut combined = a.borrow().clone();
                    combined.extend(b.borrow().iter().cloned());
                    self.check_len(combined.len(), "list")?;
                    Ok(Value::list(combined))
                }
                _ => self
                    .float_pair(&lhs, &rhs)
                    .map(|(a, b)| Value::Float(a + b))
                    .ok_or_else(|| mismatch("add", &lhs, &rhs)),
            },
            BinaryOp::Sub => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_sub(*b)
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::new("integer overflow")),
                _ => self
                    .float_pair(&lhs, &rhs)
                    .map(|(a, b)| Value::Float(a - b))
                    .ok_or_else(|| mismatch("subtract", &lhs, &rhs)),
            },
            BinaryOp::Mul => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_mul(*b)
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::new("integer overflow")),
                _ => self
                    .float_pair(&lhs, &rhs)
                    .map(|(a, b)| Value::Float(a * b))
                    .ok_or_else(|| mismatch("multiply", &lhs, &rhs)),
            },
            BinaryOp::Div => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => {
                    if *b == 0 {
                        return Err(RuntimeError::new("division by zero"));
                    }
                    a.checked_div(*b)
                        .map(Value::Int)
                        .ok_or_else(|| RuntimeError::new("integer overflow"))
                }
                _ => {
                    let (a, b) = self
                        .float_pair(&lhs, &rhs)
                        .ok_or_else(|| mismatch("divide", &lhs, &rhs))?;
                    if b == 0.0 {
                        return Err(RuntimeError::new("division by zero"));
                    }
                    Ok(Value::Float(a / b))
                }
            },
            BinaryOp::Rem => match (&lhs, &rhs) {
                (Value::Int(a), Value::Int(b)) => {
                    if *b == 0 {
                        return Err(RuntimeError::new("division by zero"));
                    }
                    a.checked_rem(*b)
                        .map(Value::Int)
                        .ok_or_else(|| RuntimeError::new("integer overflow"))
                }
                _ => {
                    let (a, b) = self
                        .float_pair(&lhs, &rhs)
                        .ok_or_else(|| mismatch("take remainder of", &lhs, &rhs))?;
                    if b == 0.0 {
                        return Err(RuntimeError::new("division by zero"));
                    }
                    Ok(Value::Float(a % b))
                }
            },
            BinaryOp::Eq => Ok(Value::Bool(structural_eq(&lhs, &rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!structural_eq(&lhs, &rhs))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = order_of(&lhs, &rhs)?;
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuited in eval"),
        }
    }

    fn float_pair(&self, lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
        let as_float = |value: &Value| match value {
            Value::Int(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            _ => None,
        };
        Some((as_float(lhs)?, as_float(rhs)?))
    }

    fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let arity = |expected: usize, args: &[Value]| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(RuntimeError::new(format!(
                    "{name}() takes {expected} argument(s), {} given",
                    args.len()
                )))
            }
        };
        match name {
            "len" => {
                arity(1, &args)?;
                match &args[0] {
                    Value::List(items) => Ok(Value::Int(items.borrow().len() as i64)),
                    Value::Str(text) => Ok(Value::Int(text.chars().count() as i64)),
                    other => Err(RuntimeError::new(format!(
                        "len() needs a list or string, got {}",
                        other.type_name()
                    ))),
                }
            }
            "abs" => {
                arity(1, &args)?;
                match &args[0] {
                    Value::Int(int) => int
                        .checked_abs()
                        .map(Value::Int)
                        .ok_or_else(|| RuntimeError::new("integer overflow")),
                    Value::Float(float) => Ok(Value::Float(float.abs())),
                    other => Err(RuntimeError::new(format!(
                        "abs() needs a number, got {}",
                        other.type_name()
                    ))),
                }
            }
            "floor" => {
                arity(1, &args)?;
                match &args[0] {
                    Value::Int(int) => Ok(Value::Int(*int)),
                    Value::Float(float) => Ok(Value::Int(float.floor() as i64)),
                    other => Err(RuntimeError::new(format!(
                        "floor() needs a number, got {}",
                        other.type_name()
                    ))),
                }
            }
            "min" | "max" => self.fold_extremum(name, args),
            "push" => {
                arity(2, &args)?;
                let Value::List(items) = &args[0] else {
                    return Err(RuntimeError::new(format!(
                        "push() needs a list, got {}",
                        args[0].type_name()
                    )));
                };
                self.check_len(items.borrow().len() + 1, "list")?;
                items.borrow_mut().push(args[1].clone());
                Ok(Value::Null)
            }
            "pop" => {
                arity(1, &args)?;
                let Value::List(items) = &args[0] else {
                    return Err(RuntimeError::new(format!(
                        "pop() needs a list, got {}",
                        args[0].type_name()
                    )));
                };
                let popped = items.borrow_mut().pop();
                popped.ok_or_else(|| RuntimeError::new("pop() from an empty list"))
            }
            "range" => {
                let (start, stop) = match args.len() {
                    1 => (0, as_int(&args[0], "range() bound")?),
                    2 => (
                        as_int(&args[0], "range() bound")?,
                        as_int(&args[1], "range() bound")?,
                    ),
                    given => {
                        return Err(RuntimeError::new(format!(
                            "range() takes 1 or 2 argument(s), {given} given"
                        )))
                    }
                };
                let count = stop.saturating_sub(start).max(0) as usize;
                self.check_len(count, "range")?;
                Ok(Value::list((start..stop).map(Value::Int).collect()))
            }
            "sorted" => {
                arity(1, &args)?;
                let Value::List(items) = &args[0] else {
                    return Err(RuntimeError::new(format!(
                        "sorted() needs a list, got {}",
                        args[0].type_name()
                    )));
                };
                let mut sorted = items.borrow().clone();
                for pair in sorted.windows(2) {
                    order_of(&pair[0], &pair[1])?;
                }
                sorted.sort_by(|a, b| order_of(a, b).unwrap_or(Ordering::Equal));
                Ok(Value::list(sorted))
            }
            "contains" => {
                arity(2, &args)?;
                match (&args[0], &args[1]) {
                    (Value::List(items), needle) => Ok(Value::Bool(
                        items
                            .borrow()
                            .iter()
                            .any(|item| structural_eq(item, needle)),
                    )),
                    (Value::Str(text), Value::Str(needle)) => {
                        Ok(Value::Bool(text.contains(needle.as_ref())))
                    }
                    (a, b) => Err(RuntimeError::new(format!(
                        "contains() cannot search {} for {}",
                        a.type_name(),
                        b.type_name()
                    ))),
                }
            }
            "slice" => {
                arity(3, &args)?;
                let start = as_int(&args[1], "slice() bound")?.max(0) as usize;
                let stop = as_int(&args[2], "slice() bound")?.max(0) as usize;
                match &args[0] {
                    Value::List(items) => {
                        let items = items.borrow();
                        let start = start.min(items.len());
                        let stop = stop.clamp(start, items.len());
                        Ok(Value::list(items[start..stop].to_vec()))
                    }
                    Value::Str(text) => {
                        let chars: Vec<char> = text.chars().collect();
                        let start = start.min(chars.len());
                        let stop = stop.clamp(start, chars.len());
                        Ok(Value::str(chars[start..stop].iter().collect::<String>()))
                    }
                    other => Err(RuntimeError::new(format!(
                        "slice() needs a list or string, got {}",
                        other.type_name()
                    ))),
                }
            }
            "lower" | "upper" => {
                arity(1, &args)?;
                let Value::Str(text) = &args[0] else {
                    return Err(RuntimeError::new(format!(
                        "{name}() needs a string, got {}",
                        args[0].type_name()
                    )));
                };
                Ok(Value::str(if name == "lower" {
                    text.to_lowercase()
                } else {
                    text.to_uppercase()
                }))
            }
            "str" => {
                arity(1, &args)?;
                Ok(Value::str(args[0].to_string()))
            }
            "int" => {
                arity(1, &args)?;
                match &args[0] {
                    Value::Int(int) => Ok(Value::Int(*int)),
                    Value::Float(float) => Ok(Value::Int(float.trunc() as i64)),
                    Value::Str(text) => text
                        .trim()
                        .parse::<i64>()
                        .map(Value::Int)
                        .map_err(|_| RuntimeError::new(format!("cannot parse `{text}` as int"))),
                    other => Err(RuntimeError::new(format!(
                        "int() cannot convert {}",
                        other.type_name()
                    ))),
                }
            }
            _ => Err(RuntimeError::new(format!("unknown function `{name}`"))),
        }
    }

    fn fold_extremum(&self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let items: Vec<Value> = match args.len() {
            1 => match &args[0] {
                Value::List(items) => items.borrow().clone(),
                other => {
                    return Err(RuntimeError::new(format!(
                        "{name}() needs a list or two values, got {}",
                        other.type_name()
                    )))
                }
            },
            2 => args,
            given => {
                return Err(RuntimeError::new(format!(
                    "{name}() takes 1 or 2 argument(s), {given} given"
                )))
            }
        };
        let mut iter = items.into_iter();
        let Some(mut best) = iter.next() else {
            return Err(RuntimeError::new(format!("{name}() of an empty list")));
        };
        for item in iter {
            let ordering = order_of(&item, &best)?;
            let replace = if name == "min" {
                ordering == Ordering::Less
            } else {
                ordering == Ordering::Greater
            };
            if replace {
                best = item;
            }
        }
        Ok(best)
    }
}

fn as_int(value: &Value, what: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(int) => Ok(*int),
        other => Err(RuntimeError::new(format!(
            "{what} must be an int, got {}",
            other.type_name()
        ))),
    }
}

/// Resolve an index value against a collection length; negative indices count
/// from the end, as in the reference interpreter.
fn resolve_index(index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let raw = as_int(index, "index")?;
    let resolved = if raw < 0 { raw + len as i64 } else { raw };
    if resolved < 0 || resolved as usize >= len {
        return Err(RuntimeError::new(format!(
            "index {raw} out of bounds (len {len})"
        )));
    }
    Ok(resolved as usize)
}

fn order_of(lhs: &Value, rhs: &Value) -> Result<Ordering, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let as_float = |value: &Value| match value {
                Value::Int(int) => *int as f64,
                Value::Float(float) => *float,
                _ => unreachable!(),
            };
            Ok(as_float(lhs)
                .partial_cmp(&as_float(rhs))
                .unwrap_or(Ordering::Equal))
        }
        _ => Err(RuntimeError::new(format!(
            "cannot compare {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}
