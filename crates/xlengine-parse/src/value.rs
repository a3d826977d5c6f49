use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use xlengine_common::ErrorKind;

use crate::ast::AstNode;

/// The closed result sum (§3.2). Every variant below is the complete set —
/// adding a tenth would be a breaking change to the whole engine.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorKind),
    Empty,
    /// Row-major 2-D matrix of values; a "spilled" rectangular result.
    Range(Rc<Vec<Vec<Value>>>),
    /// A user-defined function (`LAMBDA`): parameter names, body, and the
    /// lexical scope it closed over.
    Function(Rc<Closure>),
    /// Sentinel for an explicitly missing lambda/call argument.
    Omitted,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn error(kind: ErrorKind) -> Self {
        Value::Error(kind)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// `toNumber` (§3.2): total, never fails — unparseable input maps to `None`
    /// which callers turn into `Error(#VALUE!)` at the point of use.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Some(0.0),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            Value::Error(_) => None,
            Value::Range(rows) => match unique_cell(rows) {
                Some(v) => v.to_number(),
                None => None,
            },
            Value::Function(_) | Value::Omitted => Some(0.0),
        }
    }

    /// `toText` (§3.2): total, never fails.
    pub fn to_text(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Error(k) => k.code().to_string(),
            Value::Empty | Value::Omitted => String::new(),
            Value::Range(rows) => rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(Value::to_text)
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect::<Vec<_>>()
                .join(";"),
            Value::Function(_) => "#LAMBDA".to_string(),
        }
    }

    /// `toBool` (§3.2).
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            _ => false,
        }
    }

    /// `isTruthy`, the IF-condition variant of `toBool` (§3.2).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Range(rows) => !rows.is_empty() && rows.iter().any(|r| !r.is_empty()),
            Value::Error(_) | Value::Empty | Value::Omitted | Value::Function(_) => false,
            other => other.to_bool(),
        }
    }
}

fn unique_cell(rows: &[Vec<Value>]) -> Option<&Value> {
    if rows.len() == 1 && rows[0].len() == 1 {
        Some(&rows[0][0])
    } else {
        None
    }
}

/// Shortest round-trip decimal rendering, matching `ryu`/`f64::to_string`
/// behavior without pulling in a dependency: Rust's `{}` formatter for `f64`
/// already produces the shortest string that round-trips exactly.
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Empty, Value::Empty) => true,
            (Value::Omitted, Value::Omitted) => true,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// `Number` carries a float and is therefore not reflexive under NaN, but the
// engine never constructs `Value::Number(NaN)` (§4.3 routes NaN results
// through `#NUM!` before they reach a `Value`), so treating equality as total
// here is safe in practice.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => n.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Error(k) => k.hash(state),
            Value::Empty | Value::Omitted => {}
            Value::Range(_) | Value::Function(_) => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A `LAMBDA` value: parameter names, the body expression, and the scope
/// it was constructed in (captured lexically, per §3.2).
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Rc<AstNode>,
    pub scope: Scope,
}

/// A chain of lexical bindings, innermost first. `LET`/`LAMBDA` invocation
/// each push one link; lookup walks outward until a name matches or the
/// chain is exhausted.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Rc<Vec<(String, Value)>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn root() -> Self {
        Scope {
            bindings: Rc::new(Vec::new()),
            parent: None,
        }
    }

    pub fn child(&self, bindings: Vec<(String, Value)>) -> Scope {
        Scope {
            bindings: Rc::new(bindings),
            parent: Some(Rc::new(self.clone())),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some((_, v)) = self
            .bindings
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }
}
