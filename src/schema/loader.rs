//! Space loader: JSON configuration to schema graph
//!
//! One JSON document describes one space. Loading is the one-time build
//! step: the document is parsed, option sources are resolved, and the
//! result goes through the sheet, workbook and space builders, so a loaded
//! space satisfies every structural invariant. Any problem is fatal and no
//! partial space is returned.
//!
//! Sheets and fields are arrays rather than maps so duplicates are caught
//! instead of being silently overwritten. The keyed objects (workbooks by
//! label, option keys) are read as [`KeyedEntries`], which keeps repeated
//! keys so the builders can reject them.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;
use tracing::{info, warn};

use super::errors::{SchemaError, SchemaResult};
use super::options::OptionRegistry;
use super::sheet::Sheet;
use super::types::{
    Cardinality, Field, FieldKind, OptionMap, ReferenceRelationship, StageVisibility,
};
use super::workbook::{Space, Workbook};
use crate::validation::{FieldValidator, Pattern};

/// A JSON object read as `(key, value)` pairs in document order.
///
/// Unlike a map, repeated keys are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedEntries<V>(pub Vec<(String, V)>);

impl<V> KeyedEntries<V> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for KeyedEntries<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> IntoIterator for KeyedEntries<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for KeyedEntries<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = KeyedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(KeyedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceConfig {
    pub name: String,
    pub slug: String,
    /// Workbooks keyed by label
    #[serde(default)]
    pub workbooks: KeyedEntries<WorkbookConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkbookConfig {
    pub name: String,
    pub slug: String,
    pub namespace: String,
    #[serde(default)]
    pub sheets: Vec<SheetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetConfig {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Kind tag of a configured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Option,
    Reference,
    Date,
}

impl FieldType {
    fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Option => "option",
            FieldType::Reference => "reference",
            FieldType::Date => "date",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub stage_visibility: StageVisibility,
    #[serde(default)]
    pub options: Option<KeyedEntries<String>>,
    /// Name of a registered option provider
    #[serde(default)]
    pub options_from: Option<String>,
    #[serde(default)]
    pub reference: Option<ReferenceConfig>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    pub sheet: String,
    pub field: String,
    pub relationship: Cardinality,
    #[serde(default)]
    pub merge_only: bool,
}

/// Configured validator. `password` and `alphanumeric` are the built-in
/// patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValidatorConfig {
    Email,
    Pattern { pattern: String },
    Password,
    Alphanumeric,
}

/// Builds spaces from JSON configuration.
#[derive(Debug, Clone, Default)]
pub struct SpaceLoader {
    options: OptionRegistry,
}

impl SpaceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `options` to resolve `options_from` references.
    pub fn with_options(options: OptionRegistry) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    /// Reads and builds the space described by the file at `path`.
    pub fn load_file(&self, path: &Path) -> SchemaResult<Space> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let config: SpaceConfig = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        let space = self.build(config)?;
        info!(
            path = %path.display(),
            space = space.name(),
            workbooks = space.workbook_count(),
            "space loaded"
        );
        Ok(space)
    }

    /// Parses and builds a space from a JSON string.
    pub fn load_str(&self, content: &str) -> SchemaResult<Space> {
        let config: SpaceConfig = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed("<in-memory>", format!("Invalid JSON: {}", e)))?;
        self.build(config)
    }

    /// Builds a space from an already parsed configuration.
    pub fn build(&self, config: SpaceConfig) -> SchemaResult<Space> {
        let mut space = Space::builder(config.name, config.slug);
        for (label, workbook) in config.workbooks {
            space = space.workbook(label, self.build_workbook(workbook)?);
        }
        space.build()
    }

    fn build_workbook(&self, config: WorkbookConfig) -> SchemaResult<Workbook> {
        let mut sheets = Vec::with_capacity(config.sheets.len());
        for sheet in config.sheets {
            sheets.push(self.build_sheet(sheet)?);
        }
        Workbook::builder(config.name, config.slug, config.namespace)
            .sheets(sheets)
            .build()
    }

    fn build_sheet(&self, config: SheetConfig) -> SchemaResult<Sheet> {
        let mut fields = Vec::with_capacity(config.fields.len());
        for field in config.fields {
            fields.push(self.build_field(&config.name, field)?);
        }

        let mut builder = Sheet::builder(config.name).fields(fields);
        if let Some(slug) = config.slug {
            builder = builder.slug(slug);
        }
        if let Some(description) = config.description {
            builder = builder.description(description);
        }
        builder.build()
    }

    fn build_field(&self, sheet: &str, config: FieldConfig) -> SchemaResult<Field> {
        let kind = self.build_kind(sheet, &config)?;
        let validators = config
            .validators
            .iter()
            .map(|v| build_validator(sheet, &config.name, v))
            .collect::<SchemaResult<Vec<_>>>()?;

        let mut field = Field::new(config.name, config.label, kind, config.stage_visibility);
        field.required = config.required;
        field.primary = config.primary;
        field.unique = config.unique;
        field.description = config.description;
        field.validators = validators;
        Ok(field)
    }

    fn build_kind(&self, sheet: &str, config: &FieldConfig) -> SchemaResult<FieldKind> {
        let field_type = config.field_type;
        let mismatch = |attribute: &str| SchemaError::KindMismatch {
            sheet: sheet.to_string(),
            field: config.name.clone(),
            kind: field_type.as_str().to_string(),
            attribute: attribute.to_string(),
        };

        if field_type != FieldType::Option {
            if config.options.is_some() {
                return Err(mismatch("options"));
            }
            if config.options_from.is_some() {
                return Err(mismatch("options_from"));
            }
        }
        if field_type != FieldType::Reference && config.reference.is_some() {
            return Err(mismatch("reference"));
        }
        if field_type != FieldType::Date && config.format.is_some() {
            return Err(mismatch("format"));
        }

        let kind = match field_type {
            FieldType::Text => FieldKind::Text,
            FieldType::Number => FieldKind::Number,
            FieldType::Date => FieldKind::Date {
                format: config.format.clone(),
            },
            FieldType::Option => {
                let options = match (&config.options, &config.options_from) {
                    (Some(_), Some(_)) => return Err(mismatch("options_from")),
                    (Some(entries), None) => collect_options(sheet, &config.name, entries)?,
                    (None, Some(source)) => self.options.resolve(source).ok_or_else(|| {
                        SchemaError::UnknownOptionSource {
                            sheet: sheet.to_string(),
                            field: config.name.clone(),
                            source_name: source.clone(),
                        }
                    })?,
                    // Empty options are reported by the sheet builder
                    (None, None) => OptionMap::new(),
                };
                FieldKind::Option { options }
            }
            FieldType::Reference => {
                let reference = config.reference.as_ref().ok_or_else(|| {
                    SchemaError::MissingAttribute {
                        sheet: sheet.to_string(),
                        field: config.name.clone(),
                        kind: field_type.as_str().to_string(),
                        attribute: "reference".to_string(),
                    }
                })?;
                let mut relationship = ReferenceRelationship::new(
                    reference.sheet.clone(),
                    reference.field.clone(),
                    reference.relationship,
                );
                relationship.merge_only = reference.merge_only;
                FieldKind::Reference { reference: relationship }
            }
        };
        Ok(kind)
    }
}

/// Turns configured option entries into an option map, rejecting a key
/// declared twice.
fn collect_options(
    sheet: &str,
    field: &str,
    entries: &KeyedEntries<String>,
) -> SchemaResult<OptionMap> {
    let mut options = OptionMap::with_capacity(entries.len());
    for (key, label) in &entries.0 {
        if options.insert(key.clone(), label.clone()).is_some() {
            warn!(sheet, field, key = %key, "duplicate option key");
            return Err(SchemaError::DuplicateOption {
                sheet: sheet.to_string(),
                field: field.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(options)
}

fn build_validator(sheet: &str, field: &str, config: &ValidatorConfig) -> SchemaResult<FieldValidator> {
    let validator = match config {
        ValidatorConfig::Email => FieldValidator::Email,
        ValidatorConfig::Password => FieldValidator::password(),
        ValidatorConfig::Alphanumeric => FieldValidator::alphanumeric(),
        ValidatorConfig::Pattern { pattern } => {
            let compiled = Pattern::new(pattern).map_err(|e| {
                warn!(sheet, field, pattern = %pattern, "pattern does not compile");
                SchemaError::InvalidPattern {
                    sheet: sheet.to_string(),
                    field: field.to_string(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }
            })?;
            FieldValidator::pattern(compiled)
        }
    };
    Ok(validator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::options::StaticOptions;
    use serde_json::json;

    fn space_json(fields: serde_json::Value) -> String {
        json!({
            "name": "HR Import",
            "slug": "hr-import",
            "workbooks": {
                "Onboarding": {
                    "name": "Onboarding",
                    "slug": "onboarding",
                    "namespace": "hr",
                    "sheets": [{ "name": "employees", "fields": fields }]
                }
            }
        })
        .to_string()
    }

    fn visible() -> serde_json::Value {
        json!({"mapping": true, "review": true, "export": true})
    }

    #[test]
    fn test_load_minimal_space() {
        let content = space_json(json!([
            {"name": "payroll_id", "label": "Payroll ID", "type": "text", "primary": true,
             "stage_visibility": visible(), "validators": [{"type": "alphanumeric"}]}
        ]));

        let space = SpaceLoader::new().load_str(&content).unwrap();
        let sheet = space.workbook("Onboarding").unwrap().sheet("employees").unwrap();
        let field = sheet.field("payroll_id").unwrap();

        assert!(field.primary);
        assert!(!field.required);
        assert_eq!(field.validators, vec![FieldValidator::alphanumeric()]);
    }

    #[test]
    fn test_options_from_registry() {
        let content = space_json(json!([
            {"name": "country", "label": "Country", "type": "option",
             "options_from": "countries", "stage_visibility": visible()}
        ]));

        let loader = SpaceLoader::with_options(
            OptionRegistry::new().with("countries", StaticOptions::new([("CA", "Canada")])),
        );
        let space = loader.load_str(&content).unwrap();
        let field = space.workbook("Onboarding").unwrap().sheet("employees").unwrap().field("country").unwrap();
        assert!(field.accepts_option("CA"));

        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(err.code(), "SHEET_UNKNOWN_OPTION_SOURCE");
    }

    #[test]
    fn test_option_without_options_rejected() {
        let content = space_json(json!([
            {"name": "country", "label": "Country", "type": "option", "stage_visibility": visible()}
        ]));
        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(err.code(), "SHEET_EMPTY_OPTIONS");
    }

    #[test]
    fn test_attribute_on_wrong_kind_rejected() {
        let content = space_json(json!([
            {"name": "notes", "label": "Notes", "type": "text",
             "options": {"a": "A"}, "stage_visibility": visible()}
        ]));
        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(err.code(), "SHEET_KIND_MISMATCH");
    }

    #[test]
    fn test_reference_without_target_rejected() {
        let content = space_json(json!([
            {"name": "manager", "label": "Manager", "type": "reference", "stage_visibility": visible()}
        ]));
        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(err.code(), "SHEET_MISSING_ATTRIBUTE");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let content = space_json(json!([
            {"name": "sin", "label": "SIN", "type": "text", "stage_visibility": visible(),
             "validators": [{"type": "pattern", "pattern": "([0-9]"}]}
        ]));
        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(err.code(), "SHEET_INVALID_PATTERN");
    }

    #[test]
    fn test_missing_stage_visibility_rejected() {
        let content = space_json(json!([
            {"name": "notes", "label": "Notes", "type": "text"}
        ]));
        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(err.code(), "CONFIG_MALFORMED");
    }

    #[test]
    fn test_duplicate_option_key_rejected() {
        let content = space_json(json!([
            {"name": "country", "label": "Country", "type": "option",
             "options": {"CA": "Canada"}, "stage_visibility": visible()}
        ]))
        .replace(r#"{"CA":"Canada"}"#, r#"{"CA":"Canada","CA":"Canadá"}"#);

        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateOption {
                sheet: "employees".into(),
                field: "country".into(),
                key: "CA".into(),
            }
        );
    }

    #[test]
    fn test_inline_options_keep_order() {
        let content = space_json(json!([
            {"name": "status", "label": "Status", "type": "option",
             "options": {"FT": "Full time", "PT": "Part time"}, "stage_visibility": visible()}
        ]));
        let space = SpaceLoader::new().load_str(&content).unwrap();
        let field = space.workbook("Onboarding").unwrap().sheet("employees").unwrap().field("status").unwrap();
        assert_eq!(field.option_keys().collect::<Vec<_>>(), vec!["FT", "PT"]);
    }

    #[test]
    fn test_duplicate_workbook_label_rejected() {
        let workbook = r#"{"name": "Onboarding", "slug": "onboarding", "namespace": "hr"}"#;
        let content = format!(
            r#"{{"name": "HR Import", "slug": "hr-import", "workbooks": {{"A": {0}, "A": {0}}}}}"#,
            workbook
        );

        let err = SpaceLoader::new().load_str(&content).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateWorkbook {
                space: "HR Import".into(),
                label: "A".into(),
            }
        );
    }

    #[test]
    fn test_keyed_entries_reject_non_objects() {
        let result: Result<KeyedEntries<String>, _> = serde_json::from_str(r#"["CA"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let content = space_json(json!([
            {"name": "notes", "label": "Notes", "type": "text", "stage_visibility": visible(),
             "hidden": true}
        ]));
        assert!(SpaceLoader::new().load_str(&content).is_err());
    }
}
