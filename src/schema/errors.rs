//! Configuration error types
//!
//! Every error here is fatal: it aborts building the schema graph and no
//! partial graph is produced. Record-level problems are never reported
//! through this type; they are `Message` values.
//!
//! Error codes:
//! - SHEET_EMPTY_NAME
//! - SHEET_DUPLICATE_FIELD
//! - SHEET_DUPLICATE_PRIMARY
//! - SHEET_EMPTY_OPTIONS
//! - SHEET_DUPLICATE_OPTION
//! - SHEET_INVALID_PATTERN
//! - SHEET_KIND_MISMATCH
//! - SHEET_MISSING_ATTRIBUTE
//! - SHEET_UNKNOWN_OPTION_SOURCE
//! - WORKBOOK_DUPLICATE_SHEET
//! - WORKBOOK_UNKNOWN_REFERENCE_SHEET
//! - WORKBOOK_UNKNOWN_REFERENCE_FIELD
//! - WORKBOOK_REFERENCE_NOT_KEY
//! - SPACE_DUPLICATE_WORKBOOK
//! - CONFIG_MALFORMED

use thiserror::Error;

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Fatal configuration errors raised while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A name, slug or label that must be present is empty
    #[error("{what} must not be empty")]
    EmptyName { what: String },

    #[error("sheet '{sheet}' declares field '{field}' more than once")]
    DuplicateField { sheet: String, field: String },

    #[error("sheet '{sheet}' has more than one primary field: '{first}' and '{second}'")]
    DuplicatePrimary {
        sheet: String,
        first: String,
        second: String,
    },

    #[error("option field '{sheet}.{field}' has no options")]
    EmptyOptions { sheet: String, field: String },

    #[error("option field '{sheet}.{field}' declares key '{key}' more than once")]
    DuplicateOption {
        sheet: String,
        field: String,
        key: String,
    },

    #[error("field '{sheet}.{field}' has an invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        sheet: String,
        field: String,
        pattern: String,
        reason: String,
    },

    /// An attribute only valid for another kind was supplied
    #[error("field '{sheet}.{field}' of type {kind} cannot have '{attribute}'")]
    KindMismatch {
        sheet: String,
        field: String,
        kind: String,
        attribute: String,
    },

    /// A kind-specific attribute the kind needs was not supplied
    #[error("field '{sheet}.{field}' of type {kind} requires '{attribute}'")]
    MissingAttribute {
        sheet: String,
        field: String,
        kind: String,
        attribute: String,
    },

    #[error("field '{sheet}.{field}' uses unknown option source '{source_name}'")]
    UnknownOptionSource {
        sheet: String,
        field: String,
        source_name: String,
    },

    #[error("workbook '{workbook}' declares sheet '{sheet}' more than once")]
    DuplicateSheet { workbook: String, sheet: String },

    #[error("field '{sheet}.{field}' references unknown sheet '{target_sheet}'")]
    UnknownReferenceSheet {
        sheet: String,
        field: String,
        target_sheet: String,
    },

    #[error("field '{sheet}.{field}' references unknown field '{target_sheet}.{target_field}'")]
    UnknownReferenceField {
        sheet: String,
        field: String,
        target_sheet: String,
        target_field: String,
    },

    #[error(
        "field '{sheet}.{field}' references '{target_sheet}.{target_field}', which is neither primary nor unique"
    )]
    ReferenceNotKey {
        sheet: String,
        field: String,
        target_sheet: String,
        target_field: String,
    },

    #[error("space '{space}' declares workbook '{label}' more than once")]
    DuplicateWorkbook { space: String, label: String },

    /// Configuration source could not be read or parsed
    #[error("malformed configuration '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl SchemaError {
    pub fn empty_name(what: impl Into<String>) -> Self {
        SchemaError::EmptyName { what: what.into() }
    }

    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::EmptyName { .. } => "SHEET_EMPTY_NAME",
            SchemaError::DuplicateField { .. } => "SHEET_DUPLICATE_FIELD",
            SchemaError::DuplicatePrimary { .. } => "SHEET_DUPLICATE_PRIMARY",
            SchemaError::EmptyOptions { .. } => "SHEET_EMPTY_OPTIONS",
            SchemaError::DuplicateOption { .. } => "SHEET_DUPLICATE_OPTION",
            SchemaError::InvalidPattern { .. } => "SHEET_INVALID_PATTERN",
            SchemaError::KindMismatch { .. } => "SHEET_KIND_MISMATCH",
            SchemaError::MissingAttribute { .. } => "SHEET_MISSING_ATTRIBUTE",
            SchemaError::UnknownOptionSource { .. } => "SHEET_UNKNOWN_OPTION_SOURCE",
            SchemaError::DuplicateSheet { .. } => "WORKBOOK_DUPLICATE_SHEET",
            SchemaError::UnknownReferenceSheet { .. } => "WORKBOOK_UNKNOWN_REFERENCE_SHEET",
            SchemaError::UnknownReferenceField { .. } => "WORKBOOK_UNKNOWN_REFERENCE_FIELD",
            SchemaError::ReferenceNotKey { .. } => "WORKBOOK_REFERENCE_NOT_KEY",
            SchemaError::DuplicateWorkbook { .. } => "SPACE_DUPLICATE_WORKBOOK",
            SchemaError::Malformed { .. } => "CONFIG_MALFORMED",
        }
    }

    /// True for errors in reference wiring between sheets
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            SchemaError::UnknownReferenceSheet { .. }
                | SchemaError::UnknownReferenceField { .. }
                | SchemaError::ReferenceNotKey { .. }
        )
    }
}
