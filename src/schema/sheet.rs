//! Sheets: one table of ordered fields

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::errors::{SchemaError, SchemaResult};
use super::types::{Field, FieldKind, PipelineStage};

/// One table of the workbook. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    fields: IndexMap<String, Field>,
}

impl Sheet {
    /// Starts building a sheet called `name`.
    pub fn builder(name: impl Into<String>) -> SheetBuilder {
        SheetBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The sheet's primary field, if it declares one.
    pub fn primary_key(&self) -> Option<&Field> {
        self.fields().find(|f| f.primary)
    }

    /// Fields shown during `stage`, in declaration order.
    pub fn visible_fields(&self, stage: PipelineStage) -> impl Iterator<Item = &Field> {
        self.fields().filter(move |f| f.is_visible(stage))
    }

    /// Reference fields of this sheet.
    pub fn reference_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields().filter(|f| f.relationship().is_some())
    }
}

/// Collects fields and checks sheet-level invariants on `build`.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    name: String,
    slug: Option<String>,
    description: Option<String>,
    fields: Vec<Field>,
}

impl SheetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Checks the sheet and freezes it.
    ///
    /// # Errors
    ///
    /// - empty sheet name, field name or label
    /// - a field name declared twice
    /// - more than one primary field
    /// - an option field without options
    ///
    /// References are checked later, when the workbook is built, since
    /// their targets live in other sheets.
    pub fn build(self) -> SchemaResult<Sheet> {
        let result = self.build_inner();
        if let Err(ref e) = result {
            warn!(code = e.code(), error = %e, "sheet rejected");
        }
        result
    }

    fn build_inner(self) -> SchemaResult<Sheet> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::empty_name("sheet name"));
        }

        let mut fields: IndexMap<String, Field> = IndexMap::with_capacity(self.fields.len());
        let mut primary: Option<String> = None;

        for field in self.fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::empty_name(format!("field name in sheet '{}'", self.name)));
            }
            if field.label.trim().is_empty() {
                return Err(SchemaError::empty_name(format!(
                    "label of field '{}.{}'",
                    self.name, field.name
                )));
            }
            if fields.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField {
                    sheet: self.name,
                    field: field.name,
                });
            }
            if let FieldKind::Option { options } = &field.kind {
                if options.is_empty() {
                    return Err(SchemaError::EmptyOptions {
                        sheet: self.name,
                        field: field.name,
                    });
                }
            }
            if field.primary {
                if let Some(first) = primary.take() {
                    return Err(SchemaError::DuplicatePrimary {
                        sheet: self.name,
                        first,
                        second: field.name,
                    });
                }
                primary = Some(field.name.clone());
            }

            fields.insert(field.name.clone(), field);
        }

        debug!(sheet = %self.name, fields = fields.len(), primary = ?primary, "sheet built");

        Ok(Sheet {
            name: self.name,
            slug: self.slug,
            description: self.description,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{OptionMap, StageVisibility};

    fn text(name: &str) -> Field {
        Field::text(name, name.to_uppercase(), StageVisibility::all())
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let sheet = Sheet::builder("employees")
            .field(text("payroll_id").primary())
            .field(text("last_name"))
            .field(text("first_name"))
            .build()
            .unwrap();

        let names: Vec<_> = sheet.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["payroll_id", "last_name", "first_name"]);
        assert_eq!(sheet.primary_key().unwrap().name, "payroll_id");
    }

    #[test]
    fn test_two_primaries_rejected() {
        let result = Sheet::builder("employees")
            .field(text("payroll_id").primary())
            .field(text("sin").primary())
            .build();

        let err = result.unwrap_err();
        assert_eq!(err.code(), "SHEET_DUPLICATE_PRIMARY");
        assert_eq!(
            err,
            SchemaError::DuplicatePrimary {
                sheet: "employees".into(),
                first: "payroll_id".into(),
                second: "sin".into(),
            }
        );
    }

    #[test]
    fn test_no_primary_is_allowed() {
        let sheet = Sheet::builder("notes").field(text("body")).build().unwrap();
        assert!(sheet.primary_key().is_none());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = Sheet::builder("employees")
            .field(text("email"))
            .field(text("email"))
            .build();
        assert_eq!(result.unwrap_err().code(), "SHEET_DUPLICATE_FIELD");
    }

    #[test]
    fn test_empty_options_rejected() {
        let result = Sheet::builder("employees")
            .field(Field::option("country", "Country", OptionMap::new(), StageVisibility::all()))
            .build();
        assert_eq!(result.unwrap_err().code(), "SHEET_EMPTY_OPTIONS");
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(Sheet::builder("  ").build().is_err());
        assert!(Sheet::builder("s").field(text("")).build().is_err());

        let unlabeled = Field::text("x", "", StageVisibility::all());
        let err = Sheet::builder("s").field(unlabeled).build().unwrap_err();
        assert_eq!(err.code(), "SHEET_EMPTY_NAME");
    }

    #[test]
    fn test_visible_fields_by_stage() {
        let sheet = Sheet::builder("employees")
            .field(text("email"))
            .field(Field::text("password", "Password", StageVisibility::new(true, true, false)))
            .build()
            .unwrap();

        let export: Vec<_> = sheet
            .visible_fields(PipelineStage::Export)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(export, vec!["email"]);
        assert_eq!(sheet.visible_fields(PipelineStage::Review).count(), 2);
    }
}
