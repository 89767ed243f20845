//! CLI module for sheetschema
//!
//! Provides command-line interface for:
//! - check: Build a space and summarize it
//! - fields: List stage-visible fields of a sheet
//! - validate: Evaluate JSON records from stdin against a sheet

mod args;
mod commands;
mod errors;
mod io;
mod logging;

pub use args::{Cli, Command, SpaceArgs, StageArg};
pub use commands::{
    check, fields, load_space, parse_option_arg, run, run_command, validate, ValidateSummary,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_records, write_json_line, Line};
pub use logging::init_logging;
