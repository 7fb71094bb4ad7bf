//! Purpose: Define the stable public Rust API boundary for dbcycle.
//! Exports: Codec, schema, store and transfer types needed by the CLI and library users.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: Callers outside the crate should only need paths under `api`.
//! Invariants: Re-exports stay additive; renames go through deprecation first.

mod validation;

pub use crate::core::container::ContainerFile;
pub use crate::core::control::TransferControl;
pub use crate::core::decode::{RecordDecoder, StructuralWarning};
pub use crate::core::encode::{EncodedTable, RecordEncoder};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::header::{ContainerHeader, DEFAULT_BUILD, ExtendedMeta};
pub use crate::core::layout::TableLayout;
pub use crate::core::log::{LogLevel, Logger, MemoryLogger, TracingLogger, classify};
pub use crate::core::schema::{
    ContainerKind, DatabaseDefinition, FieldDefinition, ScalarType, TableDefinition,
};
pub use crate::core::value::{Row, Value};
pub use crate::store::{
    ImportTx, MemoryStore, SqliteConnector, SqliteStore, Store, StoreConnector,
};
pub use crate::transfer::{
    ExportOptions, Exporter, ImportOptions, Importer, JobReport, TableOutcome,
};
pub use validation::{ValidationIssue, ValidationReport, ValidationStatus, check_file};
