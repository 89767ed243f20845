//! Schema model for multi-sheet imports
//!
//! A [`Space`] holds labeled [`Workbook`]s, a workbook holds [`Sheet`]s, and
//! a sheet holds ordered [`Field`]s. Reference fields link a child sheet to
//! a primary or unique field of a parent sheet in the same workbook.
//!
//! # Design Principles
//!
//! - Built once, read-only afterwards; evolving a schema means rebuilding it
//! - Structural problems are fatal at build time, never per record
//! - At most one primary field per sheet
//! - Reference targets must exist and be keys
//! - The graph is `Send + Sync` and needs no locking

mod errors;
mod loader;
mod options;
mod sheet;
mod types;
mod validator;
mod workbook;

pub use errors::{SchemaError, SchemaResult};
pub use loader::{
    FieldConfig, FieldType, KeyedEntries, ReferenceConfig, SheetConfig, SpaceConfig,
    SpaceLoader, ValidatorConfig, WorkbookConfig,
};
pub use options::{OptionProvider, OptionRegistry, StaticOptions};
pub use sheet::{Sheet, SheetBuilder};
pub use types::{
    Cardinality, Field, FieldKind, OptionMap, PipelineStage, ReferenceRelationship,
    StageVisibility,
};
pub use validator::{NilPolicy, RecordReport, RecordValidator};
pub use workbook::{ReferenceEdge, Space, SpaceBuilder, Workbook, WorkbookBuilder};
