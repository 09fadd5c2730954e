//! Typed option values and the string-to-value conversion capability.

use std::fmt;

use crate::error::ConversionError;

// ============================================================================
// ArgType — declared value type of an option
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// Plain flag, takes no value.
    None,
    String,
    Int,
    Long,
    Float,
    Double,
}

impl ArgType {
    pub fn takes_arg(self) -> bool {
        !matches!(self, ArgType::None)
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgType::None => "flag",
            ArgType::String => "string",
            ArgType::Int => "int",
            ArgType::Long => "long",
            ArgType::Float => "float",
            ArgType::Double => "double",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Value — stored typed value
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Str(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
        }
    }
}

impl Value {
    /// The same value stored as `ty`, for defaults given as a Rust literal
    /// of a neighbouring type. Numbers move between widths and between
    /// integer and floating point; an integer that does not fit an `Int`
    /// does not coerce. Strings and booleans coerce only to themselves.
    pub fn coerce(&self, ty: ArgType) -> Option<Value> {
        match (self, ty) {
            (Value::Bool(b), ArgType::None) => Some(Value::Bool(*b)),
            (Value::Str(s), ArgType::String) => Some(Value::Str(s.clone())),
            (Value::Int(n), ArgType::Int) => Some(Value::Int(*n)),
            (Value::Long(n), ArgType::Int) => i32::try_from(*n).ok().map(Value::Int),
            (Value::Int(n), ArgType::Long) => Some(Value::Long(i64::from(*n))),
            (Value::Long(n), ArgType::Long) => Some(Value::Long(*n)),
            (Value::Int(n), ArgType::Float) => Some(Value::Float(*n as f32)),
            (Value::Long(n), ArgType::Float) => Some(Value::Float(*n as f32)),
            (Value::Float(n), ArgType::Float) => Some(Value::Float(*n)),
            (Value::Double(n), ArgType::Float) => Some(Value::Float(*n as f32)),
            (Value::Int(n), ArgType::Double) => Some(Value::Double(f64::from(*n))),
            (Value::Long(n), ArgType::Double) => Some(Value::Double(*n as f64)),
            (Value::Float(n), ArgType::Double) => Some(Value::Double(f64::from(*n))),
            (Value::Double(n), ArgType::Double) => Some(Value::Double(*n)),
            _ => None,
        }
    }
}

/// Trait for converting Rust values into a `Value` (defaults).
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Long(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

/// Trait for typed retrieval of a stored `Value`.
///
/// Returns `None` on a type mismatch. Widening conversions are accepted
/// (`Int` as `i64`, `Float` as `f64`).
pub trait FromValue: Sized {
    fn from_value(v: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Long(n) => Some(*n),
            Value::Int(n) => Some(i64::from(*n)),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Double(n) => Some(*n),
            Value::Float(n) => Some(f64::from(*n)),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(v: &Value) -> Option<Self> {
        Some(v.clone())
    }
}

// ============================================================================
// Convert — pluggable string-to-value conversion
// ============================================================================

/// Turns the raw text supplied for an option into a typed `Value`.
///
/// Closures with the matching signature implement this trait, so a caller
/// can swap in its own rules (e.g. accepting hex integers) without a
/// wrapper type.
pub trait Convert {
    fn convert(&self, ty: ArgType, raw: &str) -> Result<Value, ConversionError>;
}

impl<F> Convert for F
where
    F: Fn(ArgType, &str) -> Result<Value, ConversionError>,
{
    fn convert(&self, ty: ArgType, raw: &str) -> Result<Value, ConversionError> {
        self(ty, raw)
    }
}

/// Conversion through `str::parse`, ignoring surrounding whitespace for
/// numeric types.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConvert;

impl Convert for StdConvert {
    fn convert(&self, ty: ArgType, raw: &str) -> Result<Value, ConversionError> {
        let invalid = |reason: String| ConversionError {
            raw: raw.to_string(),
            expected: ty,
            reason,
        };
        match ty {
            ArgType::None => Ok(Value::Bool(true)),
            ArgType::String => Ok(Value::Str(raw.to_string())),
            ArgType::Int => raw
                .trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|e| invalid(e.to_string())),
            ArgType::Long => raw
                .trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|e| invalid(e.to_string())),
            ArgType::Float => raw
                .trim()
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|e| invalid(e.to_string())),
            ArgType::Double => raw
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}
