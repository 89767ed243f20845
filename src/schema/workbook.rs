//! Workbooks and spaces
//!
//! A workbook is the unit in which references are resolved: every reference
//! field must point at a primary or unique field of a sheet in the same
//! workbook. A space is a named set of workbook configurations.
//!
//! Both are assembled once and are read-only afterwards.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::errors::{SchemaError, SchemaResult};
use super::sheet::Sheet;
use super::types::{Field, ReferenceRelationship};

/// A reference field and the relationship it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEdge<'a> {
    /// Sheet holding the reference field (the child)
    pub sheet: &'a Sheet,
    pub field: &'a Field,
    pub relationship: &'a ReferenceRelationship,
}

impl<'a> ReferenceEdge<'a> {
    /// Name of the parent sheet
    pub fn target_sheet(&self) -> &'a str {
        &self.relationship.target_sheet
    }
}

/// Named collection of sheets shipped together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workbook {
    name: String,
    slug: String,
    namespace: String,
    sheets: IndexMap<String, Sheet>,
}

impl Workbook {
    pub fn builder(
        name: impl Into<String>,
        slug: impl Into<String>,
        namespace: impl Into<String>,
    ) -> WorkbookBuilder {
        WorkbookBuilder::new(name, slug, namespace)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Sheets in declaration order.
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Every reference edge, in sheet then field order.
    pub fn references(&self) -> impl Iterator<Item = ReferenceEdge<'_>> {
        self.sheets().flat_map(|sheet| {
            sheet.fields().filter_map(move |field| {
                field.relationship().map(|relationship| ReferenceEdge {
                    sheet,
                    field,
                    relationship,
                })
            })
        })
    }

    /// Target sheet and field of an edge.
    ///
    /// Always `Some` for edges taken from this workbook, since targets are
    /// checked when the workbook is built.
    pub fn resolve_reference(&self, edge: &ReferenceEdge<'_>) -> Option<(&Sheet, &Field)> {
        let sheet = self.sheet(&edge.relationship.target_sheet)?;
        let field = sheet.field(&edge.relationship.target_field)?;
        Some((sheet, field))
    }

    /// Sheets whose rows are only merged in with `parent`.
    pub fn merge_dependents(&self, parent: &str) -> Vec<&Sheet> {
        let mut dependents: Vec<&Sheet> = Vec::new();
        for edge in self.references() {
            if edge.relationship.merge_only
                && edge.target_sheet() == parent
                && !dependents.iter().any(|s| s.name() == edge.sheet.name())
            {
                dependents.push(edge.sheet);
            }
        }
        dependents
    }

    /// Sheets that can be migrated on their own: no merge-only reference
    /// leaves them.
    pub fn independent_sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets().filter(|sheet| {
            !sheet
                .fields()
                .filter_map(Field::relationship)
                .any(|r| r.merge_only)
        })
    }
}

/// Collects sheets and checks workbook-level invariants on `build`.
#[derive(Debug, Clone)]
pub struct WorkbookBuilder {
    name: String,
    slug: String,
    namespace: String,
    sheets: Vec<Sheet>,
}

impl WorkbookBuilder {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            namespace: namespace.into(),
            sheets: Vec::new(),
        }
    }

    pub fn sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn sheets(mut self, sheets: impl IntoIterator<Item = Sheet>) -> Self {
        self.sheets.extend(sheets);
        self
    }

    /// Checks names and reference integrity, then freezes the workbook.
    ///
    /// # Errors
    ///
    /// - empty name, slug or namespace
    /// - a sheet name declared twice
    /// - a reference to a missing sheet or field
    /// - a reference to a field that is neither primary nor unique
    pub fn build(self) -> SchemaResult<Workbook> {
        let result = self.build_inner();
        if let Err(ref e) = result {
            warn!(code = e.code(), error = %e, "workbook rejected");
        }
        result
    }

    fn build_inner(self) -> SchemaResult<Workbook> {
        for (what, value) in [
            ("workbook name", &self.name),
            ("workbook slug", &self.slug),
            ("workbook namespace", &self.namespace),
        ] {
            if value.trim().is_empty() {
                return Err(SchemaError::empty_name(what));
            }
        }

        let mut sheets: IndexMap<String, Sheet> = IndexMap::with_capacity(self.sheets.len());
        for sheet in self.sheets {
            if sheets.contains_key(sheet.name()) {
                return Err(SchemaError::DuplicateSheet {
                    workbook: self.name,
                    sheet: sheet.name().to_string(),
                });
            }
            sheets.insert(sheet.name().to_string(), sheet);
        }

        let workbook = Workbook {
            name: self.name,
            slug: self.slug,
            namespace: self.namespace,
            sheets,
        };
        check_references(&workbook)?;

        debug!(
            workbook = %workbook.name,
            sheets = workbook.sheet_count(),
            references = workbook.references().count(),
            "workbook built"
        );
        Ok(workbook)
    }
}

fn check_references(workbook: &Workbook) -> SchemaResult<()> {
    for edge in workbook.references() {
        let relationship = edge.relationship;
        let target_sheet = workbook.sheet(&relationship.target_sheet).ok_or_else(|| {
            SchemaError::UnknownReferenceSheet {
                sheet: edge.sheet.name().to_string(),
                field: edge.field.name.clone(),
                target_sheet: relationship.target_sheet.clone(),
            }
        })?;

        let target_field = target_sheet.field(&relationship.target_field).ok_or_else(|| {
            SchemaError::UnknownReferenceField {
                sheet: edge.sheet.name().to_string(),
                field: edge.field.name.clone(),
                target_sheet: relationship.target_sheet.clone(),
                target_field: relationship.target_field.clone(),
            }
        })?;

        if !target_field.is_key() {
            return Err(SchemaError::ReferenceNotKey {
                sheet: edge.sheet.name().to_string(),
                field: edge.field.name.clone(),
                target_sheet: relationship.target_sheet.clone(),
                target_field: relationship.target_field.clone(),
            });
        }
    }
    Ok(())
}

/// Named collection of workbook configurations, keyed by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Space {
    name: String,
    slug: String,
    workbook_configs: IndexMap<String, Workbook>,
}

impl Space {
    pub fn builder(name: impl Into<String>, slug: impl Into<String>) -> SpaceBuilder {
        SpaceBuilder::new(name, slug)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn workbook(&self, label: &str) -> Option<&Workbook> {
        self.workbook_configs.get(label)
    }

    /// `(label, workbook)` pairs in declaration order.
    pub fn workbooks(&self) -> impl Iterator<Item = (&str, &Workbook)> {
        self.workbook_configs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn workbook_count(&self) -> usize {
        self.workbook_configs.len()
    }
}

#[derive(Debug, Clone)]
pub struct SpaceBuilder {
    name: String,
    slug: String,
    workbooks: Vec<(String, Workbook)>,
}

impl SpaceBuilder {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            workbooks: Vec::new(),
        }
    }

    pub fn workbook(mut self, label: impl Into<String>, workbook: Workbook) -> Self {
        self.workbooks.push((label.into(), workbook));
        self
    }

    /// # Errors
    ///
    /// Empty name, slug or label, or a label used twice.
    pub fn build(self) -> SchemaResult<Space> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::empty_name("space name"));
        }
        if self.slug.trim().is_empty() {
            return Err(SchemaError::empty_name("space slug"));
        }

        let mut workbook_configs = IndexMap::with_capacity(self.workbooks.len());
        for (label, workbook) in self.workbooks {
            if label.trim().is_empty() {
                return Err(SchemaError::empty_name(format!(
                    "workbook label in space '{}'",
                    self.name
                )));
            }
            if workbook_configs.contains_key(&label) {
                warn!(space = %self.name, label = %label, "duplicate workbook label");
                return Err(SchemaError::DuplicateWorkbook {
                    space: self.name,
                    label,
                });
            }
            workbook_configs.insert(label, workbook);
        }

        debug!(space = %self.name, workbooks = workbook_configs.len(), "space built");
        Ok(Space {
            name: self.name,
            slug: self.slug,
            workbook_configs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::StageVisibility;

    fn employees() -> Sheet {
        Sheet::builder("employees")
            .field(Field::text("payroll_id", "Payroll ID", StageVisibility::all()).primary())
            .field(Field::text("email", "Email", StageVisibility::all()).unique())
            .field(Field::text("first_name", "First Name", StageVisibility::all()))
            .build()
            .unwrap()
    }

    fn certifications(target_field: &str, merge_only: bool) -> Sheet {
        let mut relationship = ReferenceRelationship::has_many("employees", target_field);
        relationship.merge_only = merge_only;
        Sheet::builder("certifications")
            .field(Field::text("number", "Certification #", StageVisibility::all()).primary())
            .field(Field::reference("employee", "Employee", relationship, StageVisibility::all()))
            .build()
            .unwrap()
    }

    fn workbook(sheets: Vec<Sheet>) -> SchemaResult<Workbook> {
        Workbook::builder("Onboarding", "onboarding", "hr").sheets(sheets).build()
    }

    #[test]
    fn test_reference_to_primary_accepted() {
        let wb = workbook(vec![employees(), certifications("payroll_id", false)]).unwrap();
        assert_eq!(wb.references().count(), 1);

        let edge = wb.references().next().unwrap();
        let (sheet, field) = wb.resolve_reference(&edge).unwrap();
        assert_eq!(sheet.name(), "employees");
        assert_eq!(field.name, "payroll_id");
    }

    #[test]
    fn test_reference_to_unique_accepted() {
        assert!(workbook(vec![employees(), certifications("email", false)]).is_ok());
    }

    #[test]
    fn test_reference_to_plain_field_rejected() {
        let err = workbook(vec![employees(), certifications("first_name", false)]).unwrap_err();
        assert_eq!(err.code(), "WORKBOOK_REFERENCE_NOT_KEY");
    }

    #[test]
    fn test_reference_to_missing_targets_rejected() {
        let err = workbook(vec![certifications("payroll_id", false)]).unwrap_err();
        assert_eq!(err.code(), "WORKBOOK_UNKNOWN_REFERENCE_SHEET");

        let err = workbook(vec![employees(), certifications("badge", false)]).unwrap_err();
        assert_eq!(err.code(), "WORKBOOK_UNKNOWN_REFERENCE_FIELD");
    }

    #[test]
    fn test_reference_order_independent_of_sheet_order() {
        assert!(workbook(vec![certifications("payroll_id", false), employees()]).is_ok());
    }

    #[test]
    fn test_duplicate_sheet_rejected() {
        let err = workbook(vec![employees(), employees()]).unwrap_err();
        assert_eq!(err.code(), "WORKBOOK_DUPLICATE_SHEET");
    }

    #[test]
    fn test_merge_dependents() {
        let wb = workbook(vec![employees(), certifications("payroll_id", true)]).unwrap();

        let dependents: Vec<_> = wb.merge_dependents("employees").iter().map(|s| s.name()).collect();
        assert_eq!(dependents, vec!["certifications"]);
        assert!(wb.merge_dependents("certifications").is_empty());

        let independent: Vec<_> = wb.independent_sheets().map(|s| s.name()).collect();
        assert_eq!(independent, vec!["employees"]);
    }

    #[test]
    fn test_without_merge_only_every_sheet_is_independent() {
        let wb = workbook(vec![employees(), certifications("payroll_id", false)]).unwrap();
        assert_eq!(wb.independent_sheets().count(), 2);
        assert!(wb.merge_dependents("employees").is_empty());
    }

    #[test]
    fn test_space_labels() {
        let wb = workbook(vec![employees()]).unwrap();
        let space = Space::builder("HR Import", "hr-import")
            .workbook("Onboarding", wb.clone())
            .build()
            .unwrap();
        assert_eq!(space.workbook("Onboarding").unwrap().slug(), "onboarding");
        assert_eq!(space.workbook_count(), 1);

        let err = Space::builder("HR Import", "hr-import")
            .workbook("Onboarding", wb.clone())
            .workbook("Onboarding", wb)
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "SPACE_DUPLICATE_WORKBOOK");
    }
}
