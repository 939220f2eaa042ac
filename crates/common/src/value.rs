//! Runtime value representation.
//!
//! Values live in frame slots and on the value stack. A value never changes
//! kind in place; conversions always produce a new value.

use std::cmp::Ordering;
use std::fmt;

use crate::hexfloat;
use crate::operand::DataType;

/// Runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Fully decoded text (no `\DDD` escapes left).
    Str(String),
}

// Bitwise equality for Float keeps Value usable in assertions and maps.
// The language-level EQ goes through `try_eq`, which uses IEEE comparison.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// The kind of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Nil => DataType::Nil,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Str(_) => DataType::String,
        }
    }

    /// Name reported by `TYPE`.
    pub fn type_name(&self) -> &'static str {
        self.data_type().name()
    }

    /// Language equality.
    ///
    /// Nil equals only Nil and is never a type error. Two non-nil values
    /// must share a kind; `None` means they are incomparable.
    pub fn try_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Nil, Value::Nil) => Some(true),
            (Value::Nil, _) | (_, Value::Nil) => Some(false),
            (Value::Bool(a), Value::Bool(b)) => Some(a == b),
            (Value::Int(a), Value::Int(b)) => Some(a == b),
            (Value::Float(a), Value::Float(b)) => Some(a == b),
            (Value::Str(a), Value::Str(b)) => Some(a == b),
            _ => None,
        }
    }

    /// `self < other`, or `None` if the pair has no ordering.
    pub fn try_lt(&self, other: &Value) -> Option<bool> {
        self.compare(other, Ordering::is_lt)
    }

    /// `self > other`, or `None` if the pair has no ordering.
    pub fn try_gt(&self, other: &Value) -> Option<bool> {
        self.compare(other, Ordering::is_gt)
    }

    // Nil has no ordering. A NaN operand makes every comparison false.
    fn compare(&self, other: &Value, test: fn(Ordering) -> bool) -> Option<bool> {
        let ordering = match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => match a.partial_cmp(b) {
                Some(ordering) => ordering,
                None => return Some(false),
            },
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => return None,
        };
        Some(test(ordering))
    }

    /// Text written to the diagnostic stream by `DPRINT`.
    ///
    /// Unlike [`Display`](fmt::Display), nil is spelled out and floats use
    /// their plain decimal form. No newline is added.
    pub fn diagnostic(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Float(f) => format!("{f:?}"),
            other => other.to_string(),
        }
    }
}

/// The `WRITE` form: nil is empty, bools are `true`/`false`, floats use
/// the hexadecimal notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&hexfloat::format(*x)),
            Value::Str(s) => f.write_str(s),
        }
    }
}
