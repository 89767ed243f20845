//! JSON line I/O for the CLI
//!
//! - Input: one JSON object per line; blank lines are skipped
//! - A line that is not a JSON object is reported, not fatal
//! - Output: one JSON value per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{CliError, CliResult};

/// One non-blank input line, with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Record(usize, Map<String, Value>),
    /// Not valid JSON, or not an object
    Malformed { row: usize, reason: String },
}

impl Line {
    pub fn row(&self) -> usize {
        match self {
            Line::Record(row, _) => *row,
            Line::Malformed { row, .. } => *row,
        }
    }
}

/// Reads JSON object records line by line from `reader`.
///
/// Only read failures are errors; a bad line comes back as
/// [`Line::Malformed`] so the caller can carry on.
pub fn read_records<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Line>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(CliError::from(e))),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(Ok(parse_line(index + 1, &line)))
        })
}

fn parse_line(row: usize, line: &str) -> Line {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => Line::Record(row, record),
        Ok(other) => Line::Malformed {
            row,
            reason: format!("expected a JSON object, got {}", json_type_name(&other)),
        },
        Err(e) => Line::Malformed {
            row,
            reason: format!("invalid JSON: {}", e),
        },
    }
}

/// Writes `value` as one JSON line and flushes.
pub fn write_json_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
