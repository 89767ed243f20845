//! Field definitions
//!
//! Supported kinds:
//! - text: free text
//! - number: numeric cell
//! - option: single choice from a fixed key set
//! - reference: foreign key into another sheet's primary or unique field
//! - date: date cell, optionally with a display format
//!
//! Kind-specific attributes live on the kind variant, so an option field
//! always carries its options and a reference field always carries its
//! relationship.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::guard::Value;
use crate::validation::{run_validations, FieldValidator, Message, Validator};

/// Stored option key -> display label, in declaration order.
pub type OptionMap = IndexMap<String, String>;

/// Phase of the import pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Mapping,
    Review,
    Export,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Mapping => "mapping",
            PipelineStage::Review => "review",
            PipelineStage::Export => "export",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a field is shown or used in each pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVisibility {
    pub mapping: bool,
    pub review: bool,
    pub export: bool,
}

impl StageVisibility {
    pub fn new(mapping: bool, review: bool, export: bool) -> Self {
        Self {
            mapping,
            review,
            export,
        }
    }

    /// Visible in every stage.
    pub fn all() -> Self {
        Self::new(true, true, true)
    }

    /// Hidden in every stage.
    pub fn none() -> Self {
        Self::new(false, false, false)
    }

    pub fn is_visible(&self, stage: PipelineStage) -> bool {
        match stage {
            PipelineStage::Mapping => self.mapping,
            PipelineStage::Review => self.review,
            PipelineStage::Export => self.export,
        }
    }
}

/// How many child rows may point at one parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    HasMany,
    HasOne,
}

/// Edge from a child field to a key field of a parent sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRelationship {
    pub target_sheet: String,
    pub target_field: String,
    pub cardinality: Cardinality,
    /// Child rows are only migrated together with the sheets that merge
    /// them in, never on their own.
    #[serde(default)]
    pub merge_only: bool,
}

impl ReferenceRelationship {
    pub fn new(
        target_sheet: impl Into<String>,
        target_field: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            target_sheet: target_sheet.into(),
            target_field: target_field.into(),
            cardinality,
            merge_only: false,
        }
    }

    pub fn has_many(target_sheet: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self::new(target_sheet, target_field, Cardinality::HasMany)
    }

    pub fn has_one(target_sheet: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self::new(target_sheet, target_field, Cardinality::HasOne)
    }

    pub fn merge_only(mut self) -> Self {
        self.merge_only = true;
        self
    }
}

/// Column kind with its kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Option { options: OptionMap },
    Reference { reference: ReferenceRelationship },
    Date {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
}

impl FieldKind {
    /// Returns the kind name used in configuration
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Option { .. } => "option",
            FieldKind::Reference { .. } => "reference",
            FieldKind::Date { .. } => "date",
        }
    }
}

/// One typed, constrained column of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    pub primary: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stage_visibility: StageVisibility,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<FieldValidator>,
}

impl Field {
    /// Creates a field with every constraint off and no validators.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
        stage_visibility: StageVisibility,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            primary: false,
            unique: false,
            description: None,
            stage_visibility,
            validators: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>, visibility: StageVisibility) -> Self {
        Self::new(name, label, FieldKind::Text, visibility)
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>, visibility: StageVisibility) -> Self {
        Self::new(name, label, FieldKind::Number, visibility)
    }

    pub fn option(
        name: impl Into<String>,
        label: impl Into<String>,
        options: OptionMap,
        visibility: StageVisibility,
    ) -> Self {
        Self::new(name, label, FieldKind::Option { options }, visibility)
    }

    pub fn reference(
        name: impl Into<String>,
        label: impl Into<String>,
        reference: ReferenceRelationship,
        visibility: StageVisibility,
    ) -> Self {
        Self::new(name, label, FieldKind::Reference { reference }, visibility)
    }

    pub fn date(
        name: impl Into<String>,
        label: impl Into<String>,
        format: Option<String>,
        visibility: StageVisibility,
    ) -> Self {
        Self::new(name, label, FieldKind::Date { format }, visibility)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Primary or unique: a legal reference target.
    pub fn is_key(&self) -> bool {
        self.primary || self.unique
    }

    pub fn options(&self) -> Option<&OptionMap> {
        match &self.kind {
            FieldKind::Option { options } => Some(options),
            _ => None,
        }
    }

    /// Stored keys of an option field; empty for other kinds.
    pub fn option_keys(&self) -> impl Iterator<Item = &str> {
        self.options()
            .into_iter()
            .flat_map(|options| options.keys().map(String::as_str))
    }

    /// True when `key` is one of this option field's stored keys.
    ///
    /// Display labels are never accepted in place of keys.
    pub fn accepts_option(&self, key: &str) -> bool {
        self.options().map_or(false, |options| options.contains_key(key))
    }

    pub fn relationship(&self) -> Option<&ReferenceRelationship> {
        match &self.kind {
            FieldKind::Reference { reference } => Some(reference),
            _ => None,
        }
    }

    pub fn is_visible(&self, stage: PipelineStage) -> bool {
        self.stage_visibility.is_visible(stage)
    }

    pub fn has_validation(&self) -> bool {
        !self.validators.is_empty()
    }

    /// Runs every validator against `value` and returns the failures in
    /// validator order. Empty means the value is accepted for this field.
    pub fn validate(&self, value: &Value) -> Vec<Message> {
        run_validations(self.validators.iter().map(|v| v.check(value)))
    }
}
