//! CLI-specific error types
//!
//! All CLI errors are fatal: the binary prints them and exits non-zero.

use std::fmt;
use std::io;

use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Space configuration could not be built
    SchemaError,
    /// Malformed command-line argument
    ArgumentError,
    /// Workbook or sheet not found in the space
    NotFound,
    /// I/O error (stdin/stdout or option files)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaError => "CLI_SCHEMA_ERROR",
            Self::ArgumentError => "CLI_ARGUMENT_ERROR",
            Self::NotFound => "CLI_NOT_FOUND",
            Self::IoError => "CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn argument_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ArgumentError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn unknown_workbook(label: &str) -> Self {
        Self::new(CliErrorCode::NotFound, format!("Workbook '{}' not found", label))
    }

    pub fn unknown_sheet(workbook: &str, sheet: &str) -> Self {
        Self::new(
            CliErrorCode::NotFound,
            format!("Sheet '{}' not found in workbook '{}'", sheet, workbook),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, format!("[{}] {}", e.code(), e))
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_keeps_code() {
        let err: CliError = SchemaError::empty_name("space name").into();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
        assert!(err.message().contains("SHEET_EMPTY_NAME"));
        assert!(err.to_string().starts_with("CLI_SCHEMA_ERROR"));
    }

    #[test]
    fn test_not_found_messages() {
        let err = CliError::unknown_sheet("Onboarding", "payroll");
        assert_eq!(err.code_str(), "CLI_NOT_FOUND");
        assert!(err.message().contains("payroll"));
    }
}
