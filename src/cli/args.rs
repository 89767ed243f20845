//! CLI argument definitions using clap
//!
//! Commands:
//! - sheetschema check --config <path>
//! - sheetschema fields --config <path> --workbook <label> --sheet <name> --stage <stage>
//! - sheetschema validate --config <path> --workbook <label> --sheet <name>

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::schema::PipelineStage;

/// sheetschema - check import schemas and evaluate records against them
#[derive(Parser, Debug)]
#[command(name = "sheetschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that loads a space.
#[derive(Args, Debug, Clone)]
pub struct SpaceArgs {
    /// Path to the space configuration file
    #[arg(long, default_value = "./space.json")]
    pub config: PathBuf,

    /// Option list as NAME=PATH, where PATH holds a JSON object of key -> label
    #[arg(long = "options", value_name = "NAME=PATH")]
    pub options: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the schema graph and print a summary
    Check {
        #[command(flatten)]
        space: SpaceArgs,
    },

    /// List the fields of a sheet visible at a pipeline stage
    Fields {
        #[command(flatten)]
        space: SpaceArgs,

        /// Workbook label
        #[arg(long)]
        workbook: String,

        /// Sheet name
        #[arg(long)]
        sheet: String,

        #[arg(long, value_enum)]
        stage: StageArg,
    },

    /// Evaluate JSON records read line by line from stdin
    Validate {
        #[command(flatten)]
        space: SpaceArgs,

        /// Workbook label
        #[arg(long)]
        workbook: String,

        /// Sheet name
        #[arg(long)]
        sheet: String,

        /// Run validators on nil cells too
        #[arg(long)]
        evaluate_nil: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageArg {
    Mapping,
    Review,
    Export,
}

impl From<StageArg> for PipelineStage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Mapping => PipelineStage::Mapping,
            StageArg::Review => PipelineStage::Review,
            StageArg::Export => PipelineStage::Export,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
