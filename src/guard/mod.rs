//! Guard library: pure classification of a single cell value
//!
//! # Rules
//!
//! - "nil" is null, undefined, or the empty string. A spreadsheet cell read
//!   as `""` is treated as absent.
//! - "falsy" is numeric zero, NaN, `false`, and every nil value.
//! - "truthy" is the exact complement of falsy.
//!
//! Guards never panic and look at nothing but the value's variant and
//! payload.

mod value;

pub use value::Value;

/// True only for an explicit null cell.
pub fn is_null(value: &Value) -> bool {
    matches!(value, Value::Null)
}

/// True only for a missing column.
pub fn is_undefined(value: &Value) -> bool {
    matches!(value, Value::Undefined)
}

/// True for a text cell, including the empty string.
pub fn is_string(value: &Value) -> bool {
    matches!(value, Value::String(_))
}

/// True for a numeric cell, NaN included.
pub fn is_number(value: &Value) -> bool {
    matches!(value, Value::Number(_))
}

/// Null, undefined, or the empty string.
pub fn is_nil(value: &Value) -> bool {
    is_null(value) || is_undefined(value) || value.as_str() == Some("")
}

/// Zero, NaN, `false`, or nil.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Number(n) => *n == 0.0 || n.is_nan(),
        Value::Bool(b) => !b,
        other => is_nil(other),
    }
}

/// Exact complement of [`is_falsy`].
pub fn is_truthy(value: &Value) -> bool {
    !is_falsy(value)
}
