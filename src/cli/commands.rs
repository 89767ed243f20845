//! CLI command implementations
//!
//! The CLI is a thin host around the library: it loads the space once,
//! then either reports on it or evaluates records against one sheet. Nil
//! gating for record evaluation happens here, through the `NilPolicy` the
//! user picks.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::schema::{
    NilPolicy, OptionMap, OptionRegistry, PipelineStage, RecordReport, RecordValidator, Sheet,
    Space, SpaceLoader, StaticOptions, Workbook,
};

use super::args::{Cli, Command, SpaceArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_records, write_json_line, Line};
use super::logging::init_logging;

/// Main CLI entry point
///
/// Parses arguments, installs logging and dispatches the command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose)?;
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cmd {
        Command::Check { space } => {
            let space = load_space(&space)?;
            check(&space, &mut out)
        }
        Command::Fields {
            space,
            workbook,
            sheet,
            stage,
        } => {
            let space = load_space(&space)?;
            let sheet = find_sheet(&space, &workbook, &sheet)?;
            fields(sheet, stage.into(), &mut out)
        }
        Command::Validate {
            space,
            workbook,
            sheet,
            evaluate_nil,
        } => {
            let space = load_space(&space)?;
            let sheet = find_sheet(&space, &workbook, &sheet)?;
            let policy = if evaluate_nil {
                NilPolicy::Evaluate
            } else {
                NilPolicy::Skip
            };
            let stdin = io::stdin();
            validate(sheet, policy, stdin.lock(), &mut out).map(|_| ())
        }
    }
}

/// Loads the space named by `args`, registering any option files first.
pub fn load_space(args: &SpaceArgs) -> CliResult<Space> {
    let mut registry = OptionRegistry::new();
    for arg in &args.options {
        let (name, path) = parse_option_arg(arg)?;
        let options = load_option_file(&path)?;
        debug!(name = %name, path = %path.display(), count = options.len(), "option list registered");
        registry.register(name, StaticOptions::new(options));
    }

    let space = SpaceLoader::with_options(registry).load_file(&args.config)?;
    Ok(space)
}

/// Splits a `NAME=PATH` option argument.
pub fn parse_option_arg(arg: &str) -> CliResult<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(CliError::argument_error(format!(
            "Invalid --options value '{}': expected NAME=PATH",
            arg
        ))),
    }
}

fn load_option_file(path: &Path) -> CliResult<OptionMap> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read option file {}: {}", path.display(), e))
    })?;
    let options: OptionMap = serde_json::from_str(&content).map_err(|e| {
        CliError::io_error(format!("Invalid option file {}: {}", path.display(), e))
    })?;
    Ok(options)
}

fn find_sheet<'a>(space: &'a Space, workbook: &str, sheet: &str) -> CliResult<&'a Sheet> {
    let wb = space
        .workbook(workbook)
        .ok_or_else(|| CliError::unknown_workbook(workbook))?;
    wb.sheet(sheet)
        .ok_or_else(|| CliError::unknown_sheet(workbook, sheet))
}

/// Writes a JSON summary of the space.
pub fn check<W: Write>(space: &Space, out: &mut W) -> CliResult<()> {
    let workbooks: Vec<Value> = space
        .workbooks()
        .map(|(label, workbook)| workbook_summary(label, workbook))
        .collect();

    write_json_line(
        out,
        &json!({
            "space": space.name(),
            "slug": space.slug(),
            "workbooks": workbooks,
        }),
    )
}

fn workbook_summary(label: &str, workbook: &Workbook) -> Value {
    let sheets: Vec<Value> = workbook
        .sheets()
        .map(|sheet| {
            json!({
                "name": sheet.name(),
                "fields": sheet.field_count(),
                "primary": sheet.primary_key().map(|f| f.name.as_str()),
            })
        })
        .collect();

    let references: Vec<Value> = workbook
        .references()
        .map(|edge| {
            json!({
                "sheet": edge.sheet.name(),
                "field": edge.field.name,
                "target_sheet": edge.relationship.target_sheet,
                "target_field": edge.relationship.target_field,
                "cardinality": edge.relationship.cardinality,
                "merge_only": edge.relationship.merge_only,
            })
        })
        .collect();

    let independent: Vec<&str> = workbook.independent_sheets().map(Sheet::name).collect();

    json!({
        "label": label,
        "name": workbook.name(),
        "slug": workbook.slug(),
        "namespace": workbook.namespace(),
        "sheets": sheets,
        "references": references,
        "independent_sheets": independent,
    })
}

/// Writes the names of the fields visible at `stage`.
pub fn fields<W: Write>(sheet: &Sheet, stage: PipelineStage, out: &mut W) -> CliResult<()> {
    let names: Vec<&str> = sheet.visible_fields(stage).map(|f| f.name.as_str()).collect();
    write_json_line(
        out,
        &json!({
            "sheet": sheet.name(),
            "stage": stage,
            "fields": names,
        }),
    )
}

/// One output line of `validate`.
#[derive(Debug, Serialize)]
struct RowReport<'a> {
    row: usize,
    accepted: bool,
    #[serde(flatten)]
    report: &'a RecordReport,
}

/// Output line of `validate` for an input line that is not a record.
#[derive(Debug, Serialize)]
struct RowError<'a> {
    row: usize,
    accepted: bool,
    error: &'a str,
}

/// Totals returned by [`validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateSummary {
    pub records: usize,
    pub rejected: usize,
    /// Lines that were not JSON objects; also counted as rejected
    pub malformed: usize,
}

/// Evaluates every record from `input` and writes one report per line.
///
/// A malformed line gets an error row and evaluation continues. Only
/// read and write failures stop the run.
pub fn validate<R: BufRead, W: Write>(
    sheet: &Sheet,
    policy: NilPolicy,
    input: R,
    out: &mut W,
) -> CliResult<ValidateSummary> {
    let validator = RecordValidator::new(sheet).with_nil_policy(policy);
    let mut summary = ValidateSummary::default();

    for line in read_records(input) {
        let (row, record) = match line? {
            Line::Record(row, record) => (row, record),
            Line::Malformed { row, reason } => {
                warn!(row, reason = %reason, "malformed input line");
                summary.records += 1;
                summary.rejected += 1;
                summary.malformed += 1;
                write_json_line(
                    out,
                    &RowError {
                        row,
                        accepted: false,
                        error: &reason,
                    },
                )?;
                continue;
            }
        };
        let report = validator.validate_json(&record);
        let accepted = report.is_accepted();

        summary.records += 1;
        if !accepted {
            summary.rejected += 1;
        }

        write_json_line(
            out,
            &RowReport {
                row,
                accepted,
                report: &report,
            },
        )?;
    }

    info!(
        sheet = sheet.name(),
        records = summary.records,
        rejected = summary.rejected,
        malformed = summary.malformed,
        "validation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, StageVisibility};
    use crate::validation::FieldValidator;
    use std::io::Cursor;

    fn employees() -> Sheet {
        Sheet::builder("employees")
            .field(
                Field::text("payroll_id", "Payroll ID", StageVisibility::all())
                    .primary()
                    .required()
                    .with_validator(FieldValidator::alphanumeric()),
            )
            .field(
                Field::text("password", "Password", StageVisibility::new(true, true, false))
                    .with_validator(FieldValidator::password()),
            )
            .build()
            .unwrap()
    }

    fn output_lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_option_arg() {
        let (name, path) = parse_option_arg("countries=data/countries.json").unwrap();
        assert_eq!(name, "countries");
        assert_eq!(path, PathBuf::from("data/countries.json"));

        assert!(parse_option_arg("countries").is_err());
        assert!(parse_option_arg("=x.json").is_err());
    }

    #[test]
    fn test_validate_writes_report_per_record() {
        let sheet = employees();
        let input = Cursor::new("{\"payroll_id\": \"AB12\", \"password\": \"short\"}\n{\"payroll_id\": \"CD34\"}\n");
        let mut out = Vec::new();

        let summary = validate(&sheet, NilPolicy::Skip, input, &mut out).unwrap();
        assert_eq!(
            summary,
            ValidateSummary {
                records: 2,
                rejected: 1,
                malformed: 0,
            }
        );

        let lines = output_lines(out);
        assert_eq!(lines[0]["row"], 1);
        assert_eq!(lines[0]["accepted"], false);
        assert_eq!(
            lines[0]["messages"]["password"][0]["text"],
            "Value does not meet required format."
        );
        assert_eq!(lines[1]["accepted"], true);
    }

    #[test]
    fn test_malformed_line_does_not_stop_batch() {
        let sheet = employees();
        let input = Cursor::new("{\"payroll_id\": \"AB12\"}\nnot json\n{\"payroll_id\": \"AB-12\"}\n");
        let mut out = Vec::new();

        let summary = validate(&sheet, NilPolicy::Skip, input, &mut out).unwrap();
        assert_eq!(
            summary,
            ValidateSummary {
                records: 3,
                rejected: 2,
                malformed: 1,
            }
        );

        let lines = output_lines(out);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["accepted"], true);
        assert_eq!(lines[1]["row"], 2);
        assert_eq!(lines[1]["accepted"], false);
        assert!(lines[1]["error"].as_str().unwrap().starts_with("invalid JSON"));
        assert_eq!(lines[2]["row"], 3);
        assert_eq!(lines[2]["accepted"], false);
    }

    #[test]
    fn test_fields_by_stage() {
        let sheet = employees();
        let mut out = Vec::new();
        fields(&sheet, PipelineStage::Export, &mut out).unwrap();

        let lines = output_lines(out);
        assert_eq!(lines[0]["stage"], "export");
        assert_eq!(lines[0]["fields"], json!(["payroll_id"]));
    }
}
