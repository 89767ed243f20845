//! Record evaluation against a sheet
//!
//! Runs each declared field's validators over that field's cell and
//! collects the messages per field. Evaluation never stops early: one
//! failing field does not hide the others.
//!
//! Option fields accept exactly their stored keys. A non-nil option cell
//! whose text is not a key (a display label included) gets an error before
//! the field's own validators run.
//!
//! Nil gating is the caller's decision, made explicit through
//! [`NilPolicy`]. Under `Skip`, nil cells are not validated and required
//! fields with a nil cell are listed in `missing_required` instead.
//! Uniqueness and reference resolution need the whole dataset and are not
//! checked here.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Map;
use tracing::trace;

use super::sheet::Sheet;
use super::types::Field;
use crate::guard::{is_nil, Value};
use crate::validation::{Message, INVALID_OPTION};

/// What to do with nil cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NilPolicy {
    /// Do not run validators on nil cells
    #[default]
    Skip,
    /// Run validators on every cell, nil or not
    Evaluate,
}

/// Outcome of evaluating one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordReport {
    /// Field name -> messages, only for fields with at least one message
    pub messages: IndexMap<String, Vec<Message>>,
    /// Required fields whose cell is nil
    pub missing_required: Vec<String>,
    /// Columns the sheet does not declare
    pub unknown_columns: Vec<String>,
}

impl RecordReport {
    /// True when nothing blocks the record: no error-kind message and no
    /// missing required field.
    pub fn is_accepted(&self) -> bool {
        self.missing_required.is_empty()
            && !self.messages.values().flatten().any(Message::is_error)
    }

    pub fn message_count(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    pub fn field_messages(&self, field: &str) -> &[Message] {
        self.messages.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Key-set check for option fields; `None` for other kinds and nil cells.
fn option_check(field: &Field, value: &Value) -> Option<Message> {
    field.options()?;
    let text = value.match_text()?;
    (!field.accepts_option(&text)).then(|| Message::error(INVALID_OPTION))
}

/// Evaluates records against one sheet.
pub struct RecordValidator<'a> {
    sheet: &'a Sheet,
    nil_policy: NilPolicy,
}

impl<'a> RecordValidator<'a> {
    pub fn new(sheet: &'a Sheet) -> Self {
        Self {
            sheet,
            nil_policy: NilPolicy::default(),
        }
    }

    pub fn with_nil_policy(mut self, nil_policy: NilPolicy) -> Self {
        self.nil_policy = nil_policy;
        self
    }

    pub fn sheet(&self) -> &Sheet {
        self.sheet
    }

    /// Evaluates a record given as (column, value) pairs.
    pub fn validate_cells<'r, I>(&self, cells: I) -> RecordReport
    where
        I: IntoIterator<Item = (&'r str, Value)>,
    {
        let cells: IndexMap<&str, Value> = cells.into_iter().collect();
        let mut report = RecordReport::default();

        for field in self.sheet.fields() {
            let value = cells.get(field.name.as_str()).cloned().unwrap_or_default();

            if is_nil(&value) {
                if field.required {
                    report.missing_required.push(field.name.clone());
                }
                if self.nil_policy == NilPolicy::Skip {
                    continue;
                }
            }

            let mut messages: Vec<Message> = option_check(field, &value).into_iter().collect();
            if field.has_validation() {
                messages.extend(field.validate(&value));
            }

            if !messages.is_empty() {
                trace!(sheet = self.sheet.name(), field = %field.name, count = messages.len(), "field rejected");
                report.messages.insert(field.name.clone(), messages);
            }
        }

        report.unknown_columns = cells
            .keys()
            .filter(|column| !self.sheet.contains_field(column))
            .map(|column| column.to_string())
            .collect();

        report
    }

    /// Evaluates a JSON object record; absent columns are undefined.
    pub fn validate_json(&self, record: &Map<String, serde_json::Value>) -> RecordReport {
        self.validate_cells(record.iter().map(|(k, v)| (k.as_str(), Value::from_json(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{OptionMap, StageVisibility};
    use crate::validation::{FieldValidator, INVALID_EMAIL, INVALID_FORMAT, INVALID_OPTION};
    use serde_json::json;

    fn employees() -> Sheet {
        Sheet::builder("employees")
            .field(
                Field::text("payroll_id", "Payroll ID", StageVisibility::all())
                    .primary()
                    .required()
                    .with_validator(FieldValidator::alphanumeric()),
            )
            .field(
                Field::text("email", "Email", StageVisibility::all())
                    .with_validator(FieldValidator::Email),
            )
            .field(Field::text("notes", "Notes", StageVisibility::all()))
            .build()
            .unwrap()
    }

    fn record(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_valid_record_accepted() {
        let sheet = employees();
        let report = RecordValidator::new(&sheet)
            .validate_json(&record(json!({"payroll_id": "AB12", "email": "a@b.com"})));

        assert!(report.is_accepted());
        assert_eq!(report.message_count(), 0);
    }

    #[test]
    fn test_every_failing_field_reported() {
        let sheet = employees();
        let report = RecordValidator::new(&sheet)
            .validate_json(&record(json!({"payroll_id": "AB-12", "email": "nope"})));

        assert!(!report.is_accepted());
        assert_eq!(report.field_messages("payroll_id")[0].text, INVALID_FORMAT);
        assert_eq!(report.field_messages("email")[0].text, INVALID_EMAIL);
        assert!(report.field_messages("notes").is_empty());
    }

    #[test]
    fn test_skip_policy_gates_nil_cells() {
        let sheet = employees();
        let report = RecordValidator::new(&sheet)
            .validate_json(&record(json!({"email": ""})));

        assert_eq!(report.missing_required, vec!["payroll_id"]);
        assert_eq!(report.message_count(), 0);
        assert!(!report.is_accepted());
    }

    #[test]
    fn test_evaluate_policy_runs_on_nil_cells() {
        let sheet = employees();
        let report = RecordValidator::new(&sheet)
            .with_nil_policy(NilPolicy::Evaluate)
            .validate_json(&record(json!({"email": null})));

        assert_eq!(report.missing_required, vec!["payroll_id"]);
        assert_eq!(report.field_messages("payroll_id")[0].text, INVALID_FORMAT);
        assert_eq!(report.field_messages("email")[0].text, INVALID_EMAIL);
    }

    #[test]
    fn test_unknown_columns_listed() {
        let sheet = employees();
        let report = RecordValidator::new(&sheet)
            .validate_json(&record(json!({"payroll_id": "A1", "badge": "x"})));

        assert_eq!(report.unknown_columns, vec!["badge"]);
        assert!(report.is_accepted());
    }

    fn countries() -> Sheet {
        let mut options = OptionMap::new();
        options.insert("CA".into(), "Canada".into());
        options.insert("US".into(), "United States".into());
        Sheet::builder("offices")
            .field(Field::option("country", "Country", options, StageVisibility::all()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_option_cell_must_be_a_key() {
        let sheet = countries();
        let validator = RecordValidator::new(&sheet);

        for rejected in ["ZZ", "Canada"] {
            let report = validator.validate_cells([("country", Value::from(rejected))]);
            assert!(!report.is_accepted(), "{} accepted", rejected);
            assert_eq!(report.field_messages("country")[0].text, INVALID_OPTION);
        }

        let report = validator.validate_cells([("country", Value::from("CA"))]);
        assert!(report.is_accepted());
        assert_eq!(report.message_count(), 0);
    }

    #[test]
    fn test_nil_option_cell_not_checked_against_keys() {
        let sheet = countries();
        let report = RecordValidator::new(&sheet)
            .with_nil_policy(NilPolicy::Evaluate)
            .validate_cells([("country", Value::from(""))]);
        assert!(report.is_accepted());
    }

    #[test]
    fn test_option_check_precedes_validators() {
        let mut options = OptionMap::new();
        options.insert("A1".into(), "First".into());
        let sheet = Sheet::builder("codes")
            .field(
                Field::option("code", "Code", options, StageVisibility::all())
                    .with_validator(FieldValidator::alphanumeric()),
            )
            .build()
            .unwrap();

        let report = RecordValidator::new(&sheet).validate_cells([("code", Value::from("B-2"))]);
        let texts: Vec<_> = report.field_messages("code").iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![INVALID_OPTION, INVALID_FORMAT]);
    }

    #[test]
    fn test_warnings_do_not_block() {
        let mut report = RecordReport::default();
        report
            .messages
            .insert("notes".into(), vec![Message::warning("long")]);
        assert!(report.is_accepted());
    }
}
