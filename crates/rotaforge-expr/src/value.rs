//! Runtime values.

use std::fmt;

use rotaforge_core::KeyPart;
use rotaforge_milp::{LinExpr, LinearConstraint};

/// A value produced while evaluating a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Linear expression over decision variables
    Linear(LinExpr),
    /// Result of comparing linear expressions
    Constraint(Box<LinearConstraint>),
    /// Reference to a variable container by name
    Container(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Linear(_) => "linear expression",
            Value::Constraint(_) => "constraint",
            Value::Container(_) => "variable container",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numbers and linear expressions as a linear expression.
    pub fn as_linear(&self) -> Option<LinExpr> {
        match self {
            Value::Linear(e) => Some(e.clone()),
            other => other.as_f64().map(LinExpr::constant),
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Value::Linear(_))
    }

    /// The key component this value stands for when used as an index.
    pub fn as_key_part(&self) -> Option<KeyPart> {
        match self {
            Value::Int(n) => Some(KeyPart::Int(*n)),
            Value::Str(s) => Some(KeyPart::Str(s.clone())),
            Value::Float(f) if f.fract() == 0.0 => Some(KeyPart::Int(*f as i64)),
            _ => None,
        }
    }

    /// Structural equality with numeric coercion between ints and floats.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            },
        }
    }
}

impl From<KeyPart> for Value {
    fn from(part: KeyPart) -> Self {
        match part {
            KeyPart::Int(n) => Value::Int(n),
            KeyPart::Str(s) => Value::Str(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Linear(_) => write!(f, "<linear expression>"),
            Value::Constraint(_) => write!(f, "<constraint>"),
            Value::Container(name) => write!(f, "{}", name),
        }
    }
}
