//! Candidate cell values
//!
//! A `Value` is what a spreadsheet cell looks like by the time it reaches a
//! validator: text, a number, a boolean, or one of the two absent forms.
//! Null and undefined stay distinct so guards can tell an explicit blank
//! from a missing column.

use std::fmt;

/// An untyped candidate cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Column present, cell explicitly null
    Null,
    /// Column absent from the record
    #[default]
    Undefined,
    /// Text cell (may be empty)
    String(String),
    /// Numeric cell
    Number(f64),
    /// Boolean cell
    Bool(bool),
}

impl Value {
    /// Returns the variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text a pattern is tested against.
    ///
    /// Nil-like values have no text. Numbers and booleans use their
    /// display form, so `12` is tested as `"12"`.
    pub fn match_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::Undefined => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(_) | Value::Bool(_) => Some(self.to_string()),
        }
    }

    /// Converts a JSON cell into a `Value`.
    ///
    /// Arrays and objects are not cell values; they are carried as their
    /// JSON text so validators still see something to reject.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }

    /// Looks up `column` in a JSON record; a missing column is `Undefined`.
    pub fn from_record(record: &serde_json::Map<String, serde_json::Value>, column: &str) -> Self {
        record.get(column).map_or(Value::Undefined, Value::from_json)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) if n.is_nan() => write!(f, "NaN"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
