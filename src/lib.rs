//! sheetschema - multi-sheet import schema with composable field validation
//!
//! - [`guard`]: classification of single cell values
//! - [`validation`]: validators, checks and the aggregator
//! - [`schema`]: fields, sheets, workbooks, spaces and their loader
//! - [`cli`]: the `sheetschema` command-line host

pub mod cli;
pub mod guard;
pub mod schema;
pub mod validation;
